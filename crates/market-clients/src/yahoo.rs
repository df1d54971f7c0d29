//! Yahoo Finance endpoints: batch quotes, charts, trending tickers, predefined
//! screeners and the weekly calendar. None of them need a key.

use crate::http::build_url;
use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use market_core::{MarketError, MarketResult, Quote, QuoteProvider, TextFetcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YahooHost {
    Query1,
    Query2,
}

impl YahooHost {
    pub fn base_url(&self) -> &'static str {
        match self {
            YahooHost::Query1 => "https://query1.finance.yahoo.com",
            YahooHost::Query2 => "https://query2.finance.yahoo.com",
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            YahooHost::Query1 => "yahoo",
            YahooHost::Query2 => "yahoo-query2",
        }
    }
}

// ----- Quotes -----

pub struct YahooQuoteProvider {
    host: YahooHost,
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse", default)]
    quote_response: QuoteResponse,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Option<Vec<YahooQuote>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_change: Option<f64>,
    #[serde(default)]
    regular_market_change_percent: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    #[serde(default)]
    regular_market_previous_close: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    quote_type: Option<String>,
    #[serde(default)]
    first_trade_date_milliseconds: Option<i64>,
    #[serde(default)]
    error: Option<Value>,
}

impl YahooQuoteProvider {
    pub fn new(host: YahooHost, fetcher: Arc<dyn TextFetcher>, timeout: Duration) -> Self {
        Self {
            host,
            fetcher,
            timeout,
        }
    }
}

/// Map a `/v7/finance/quote` body. Entries carrying an upstream `error` are kept
/// with zeroed numerics so callers can show them as unavailable.
fn normalize_quotes(source: &str, body: &str) -> MarketResult<Vec<Quote>> {
    let envelope: QuoteEnvelope =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(format!("yahoo quote: {}", e)))?;

    let quotes = envelope
        .quote_response
        .result
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| {
            let symbol = raw.symbol.filter(|s| !s.is_empty())?;

            if let Some(error) = raw.error.filter(|e| !e.is_null()) {
                let message = match error {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                return Some(Quote::with_error(symbol, source, message));
            }

            let mut quote = Quote::new(symbol, source);
            quote.price = raw.regular_market_price.unwrap_or(0.0);
            quote.change = raw.regular_market_change.unwrap_or(0.0);
            quote.change_percent = raw.regular_market_change_percent.unwrap_or(0.0);
            quote.volume = raw.regular_market_volume.unwrap_or(0.0).max(0.0) as u64;
            quote.previous_close = raw.regular_market_previous_close;
            quote.high_52w = raw.fifty_two_week_high;
            quote.low_52w = raw.fifty_two_week_low;
            quote.short_name = raw.short_name;
            quote.long_name = raw.long_name;
            quote.quote_type = raw.quote_type;
            quote.first_trade_date_milliseconds = raw.first_trade_date_milliseconds;
            Some(quote)
        })
        .collect();

    Ok(quotes)
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &str {
        self.host.provider_name()
    }

    fn display_name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        let joined = symbols.join(",");
        let url = build_url(
            self.host.base_url(),
            &["v7", "finance", "quote"],
            &[("symbols", joined.as_str())],
        )?;
        let body = self.fetcher.get_text(&url, self.timeout).await?;
        normalize_quotes(self.name(), &body)
    }
}

// ----- Charts -----

pub fn chart_url(host: YahooHost, symbol: &str, range: &str, interval: &str) -> MarketResult<String> {
    build_url(
        host.base_url(),
        &["v8", "finance", "chart", symbol],
        &[
            ("range", range),
            ("interval", interval),
            ("includePrePost", "false"),
            ("events", "div,split"),
        ],
    )
}

// ----- Trending and screeners -----

pub fn trending_url(region: &str, count: u32) -> MarketResult<String> {
    let count = count.to_string();
    build_url(
        YahooHost::Query1.base_url(),
        &["v1", "finance", "trending", region],
        &[("count", count.as_str())],
    )
}

#[derive(Debug, Default, Deserialize)]
struct FinanceEnvelope {
    #[serde(default)]
    finance: FinanceBody,
}

#[derive(Debug, Default, Deserialize)]
struct FinanceBody {
    #[serde(default)]
    result: Option<Vec<SymbolList>>,
}

#[derive(Debug, Default, Deserialize)]
struct SymbolList {
    #[serde(default)]
    quotes: Option<Vec<SymbolEntry>>,
}

#[derive(Debug, Default, Deserialize)]
struct SymbolEntry {
    #[serde(default)]
    symbol: Option<String>,
}

fn symbols_from_finance(body: &str, first_list_only: bool) -> Vec<String> {
    let envelope: FinanceEnvelope = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(e) => {
            tracing::debug!("Unreadable Yahoo finance body: {}", e);
            return Vec::new();
        }
    };

    let lists = envelope.finance.result.unwrap_or_default();
    let take = if first_list_only { 1 } else { lists.len() };

    let mut seen = HashSet::new();
    lists
        .into_iter()
        .take(take)
        .flat_map(|list| list.quotes.unwrap_or_default())
        .filter_map(|entry| entry.symbol.filter(|s| !s.is_empty()))
        .filter(|symbol| seen.insert(symbol.clone()))
        .collect()
}

/// Symbols from a trending body, deduplicated in upstream order.
pub fn parse_trending(body: &str) -> Vec<String> {
    symbols_from_finance(body, false)
}

pub fn screener_saved_url(scr_ids: &str, count: u32) -> MarketResult<String> {
    let count = count.to_string();
    build_url(
        YahooHost::Query1.base_url(),
        &["v1", "finance", "screener", "predefined", "saved"],
        &[("count", count.as_str()), ("scrIds", scr_ids)],
    )
}

/// Symbols from the first list of a predefined screener body.
pub fn parse_screener_symbols(body: &str) -> Vec<String> {
    symbols_from_finance(body, true)
}

// ----- Calendar -----

/// Sunday..Saturday of the week containing `today`.
pub fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - ChronoDuration::days(today.weekday().num_days_from_sunday() as i64);
    (start, start + ChronoDuration::days(6))
}

pub fn calendar_url(start: NaiveDate, end: NaiveDate) -> MarketResult<String> {
    let start = start.format("%Y-%m-%d").to_string();
    let end = end.format("%Y-%m-%d").to_string();
    build_url(
        YahooHost::Query1.base_url(),
        &["v1", "finance", "calendar"],
        &[
            ("startDate", start.as_str()),
            ("endDate", end.as_str()),
            ("region", "US"),
            ("lang", "en-US"),
        ],
    )
}

/// Earnings rows are passed through as-is.
pub fn parse_calendar_earnings(body: &str) -> Vec<Value> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.pointer("/earnings/earnings").cloned())
        .and_then(|v| match v {
            Value::Array(rows) => Some(rows),
            _ => None,
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicEvent {
    pub company: String,
    pub date: Option<String>,
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub impact: String,
    pub currency: String,
}

pub fn parse_calendar_economic_events(body: &str) -> Vec<EconomicEvent> {
    let rows = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("economicEvents").and_then(|v| v.as_array()).cloned())
        .unwrap_or_default();

    let text = |row: &Value, key: &str| row.get(key).and_then(|v| v.as_str()).map(str::to_string);

    rows.iter()
        .map(|row| EconomicEvent {
            company: text(row, "source").unwrap_or_else(|| "Economic Calendar".to_string()),
            date: text(row, "date"),
            time: text(row, "time"),
            kind: "economic".to_string(),
            description: text(row, "event"),
            impact: text(row, "impact").unwrap_or_else(|| "Medium".to_string()),
            currency: text(row, "currency").unwrap_or_else(|| "USD".to_string()),
        })
        .collect()
}
