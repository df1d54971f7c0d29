//! Provider fallback chain for quotes.

use chrono::Utc;
use market_core::{MarketError, Quote, QuoteProvider, UPSTREAM_UNAVAILABLE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_SYMBOL_CAP: usize = 20;
pub const MIN_SYMBOL_CAP: usize = 10;
pub const MAX_SYMBOL_CAP: usize = 50;

/// Why a provider did not settle the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptCode {
    RateLimitExceeded,
    NoData,
    FetchError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceError {
    pub source: String,
    pub code: AttemptCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatus {
    pub total_symbols: usize,
    pub found_symbols: usize,
    pub attempted_sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_source: Option<String>,
    pub errors: Vec<SourceError>,
    pub fallback_used: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteResultSet {
    pub result: Vec<Quote>,
}

/// Body of `/api/quote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    #[serde(rename = "quoteResponse")]
    pub quote_response: QuoteResultSet,
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuoteResponse {
    pub fn quotes(&self) -> &[Quote] {
        &self.quote_response.result
    }

    pub fn is_empty(&self) -> bool {
        self.quote_response.result.is_empty()
    }
}

/// Split a comma-separated list into trimmed, uppercased, unique symbols, keeping
/// at most `cap`.
pub fn parse_symbols(csv: &str, cap: usize) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for raw in csv.split(',') {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() || symbols.contains(&symbol) {
            continue;
        }
        symbols.push(symbol);
        if symbols.len() == cap {
            break;
        }
    }
    symbols
}

pub struct QuoteAggregator {
    providers: Vec<Arc<dyn QuoteProvider>>,
    symbol_cap: usize,
    technical_analysis: bool,
}

impl QuoteAggregator {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, symbol_cap: usize, technical_analysis: bool) -> Self {
        Self {
            providers,
            symbol_cap: symbol_cap.clamp(MIN_SYMBOL_CAP, MAX_SYMBOL_CAP),
            technical_analysis,
        }
    }

    pub fn symbol_cap(&self) -> usize {
        self.symbol_cap
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn fetch_csv(&self, csv: &str) -> QuoteResponse {
        let symbols = parse_symbols(csv, self.symbol_cap);
        self.fetch(&symbols).await
    }

    /// Walk the providers in order, asking each only for symbols still missing.
    ///
    /// Entries an upstream flagged with `error` are kept unless a later provider
    /// returns real data for them. Never fails: total failure is an empty result
    /// with `error: "upstream_unavailable"`.
    pub async fn fetch(&self, symbols: &[String]) -> QuoteResponse {
        let symbols: Vec<String> = symbols.iter().take(self.symbol_cap).cloned().collect();

        let mut resolved: HashMap<String, Quote> = HashMap::new();
        let mut attempted: Vec<String> = Vec::new();
        let mut errors: Vec<SourceError> = Vec::new();
        let mut successful: Option<&Arc<dyn QuoteProvider>> = None;

        for provider in &self.providers {
            let pending: Vec<String> = symbols
                .iter()
                .filter(|s| resolved.get(*s).is_none_or(Quote::is_error))
                .cloned()
                .collect();
            if pending.is_empty() {
                break;
            }

            if !provider.is_configured() {
                tracing::debug!("Skipping {}: not configured", provider.name());
                continue;
            }

            attempted.push(provider.name().to_string());
            tracing::debug!("Requesting {} symbols from {}", pending.len(), provider.name());

            match provider.fetch_quotes(&pending).await {
                Ok(quotes) => {
                    let mut contributed = 0;
                    for mut quote in quotes {
                        quote.symbol = quote.symbol.to_uppercase();
                        if !pending.contains(&quote.symbol) {
                            continue;
                        }
                        let replace = match resolved.get(&quote.symbol) {
                            None => true,
                            Some(existing) => existing.is_error() && !quote.is_error(),
                        };
                        if replace {
                            if !quote.is_error() {
                                contributed += 1;
                            }
                            resolved.insert(quote.symbol.clone(), quote);
                        }
                    }

                    if contributed > 0 {
                        successful = Some(provider);
                    } else {
                        errors.push(SourceError {
                            source: provider.name().to_string(),
                            code: AttemptCode::NoData,
                            message: format!("No data returned from {}", provider.display_name()),
                        });
                    }
                }
                Err(e) if e.is_rate_limited() => {
                    tracing::warn!("{} rate limited, trying next source", provider.name());
                    errors.push(SourceError {
                        source: provider.name().to_string(),
                        code: AttemptCode::RateLimitExceeded,
                        message: format!("Rate limit exceeded for {}. Trying next source...", provider.display_name()),
                    });
                }
                Err(MarketError::NoData(msg)) => {
                    errors.push(SourceError {
                        source: provider.name().to_string(),
                        code: AttemptCode::NoData,
                        message: msg,
                    });
                }
                Err(e) => {
                    tracing::warn!("{} quote fetch failed: {}", provider.name(), e);
                    errors.push(SourceError {
                        source: provider.name().to_string(),
                        code: AttemptCode::FetchError,
                        message: format!("Error fetching from {}: {}", provider.display_name(), e),
                    });
                }
            }
        }

        let mut result: Vec<Quote> = symbols.iter().filter_map(|s| resolved.remove(s)).collect();
        if self.technical_analysis {
            technical_analysis::attach_levels(&mut result, Utc::now());
        }

        let found = result.iter().filter(|q| !q.is_error()).count();
        let first_attempted = attempted.first().cloned();
        let successful_source = successful.map(|p| p.name().to_string());
        let fallback_used = successful_source.is_some() && successful_source != first_attempted;
        let message = status_message(found, symbols.len(), successful.map(|p| p.display_name()));

        if found < symbols.len() {
            tracing::info!("Quotes: {} of {} symbols resolved ({:?})", found, symbols.len(), attempted);
        }

        let error = result.is_empty().then(|| UPSTREAM_UNAVAILABLE.to_string());

        QuoteResponse {
            quote_response: QuoteResultSet { result },
            status: QuoteStatus {
                total_symbols: symbols.len(),
                found_symbols: found,
                attempted_sources: attempted,
                successful_source: successful_source.clone(),
                errors,
                fallback_used,
                message,
            },
            source: successful_source,
            error,
        }
    }
}

fn status_message(found: usize, total: usize, source: Option<&str>) -> String {
    match source {
        Some(source) if found == total => format!("All {} symbols loaded from {}", total, source),
        Some(_) => format!("{} of {} symbols found", found, total),
        None => "No quote data available from any source".to_string(),
    }
}
