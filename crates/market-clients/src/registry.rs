use crate::{
    AlphaVantageQuoteProvider, FinnhubQuoteProvider, IexQuoteProvider, PolygonQuoteProvider, YahooHost,
    YahooQuoteProvider,
};
use market_core::{QuoteProvider, TextFetcher};
use std::sync::Arc;
use std::time::Duration;

pub const KNOWN_PROVIDERS: &[&str] = &["polygon", "finnhub", "iex", "alphavantage", "yahoo", "yahoo-query2"];

pub const DEFAULT_PROVIDER_ORDER: &[&str] = &["polygon", "finnhub", "iex", "alphavantage", "yahoo"];

#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub polygon: Option<String>,
    pub finnhub: Option<String>,
    pub iex: Option<String>,
    pub alpha_vantage: Option<String>,
}

/// Instantiate providers in the configured order. Unknown names are skipped
/// with a warning; duplicates keep their first position.
pub fn build_quote_providers(
    order: &[String],
    keys: &ProviderKeys,
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
) -> Vec<Arc<dyn QuoteProvider>> {
    let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for name in order {
        let name = name.trim();
        if seen.contains(&name) {
            continue;
        }

        let provider: Arc<dyn QuoteProvider> = match name {
            "polygon" => Arc::new(PolygonQuoteProvider::new(keys.polygon.clone(), fetcher.clone(), timeout)),
            "finnhub" => Arc::new(FinnhubQuoteProvider::new(keys.finnhub.clone(), fetcher.clone(), timeout)),
            "iex" => Arc::new(IexQuoteProvider::new(keys.iex.clone(), fetcher.clone(), timeout)),
            "alphavantage" => Arc::new(AlphaVantageQuoteProvider::new(
                keys.alpha_vantage.clone(),
                fetcher.clone(),
                timeout,
            )),
            "yahoo" | "yahoo-query1" => Arc::new(YahooQuoteProvider::new(YahooHost::Query1, fetcher.clone(), timeout)),
            "yahoo-query2" => Arc::new(YahooQuoteProvider::new(YahooHost::Query2, fetcher.clone(), timeout)),
            other => {
                tracing::warn!("Unknown quote provider '{}' ignored", other);
                continue;
            }
        };

        seen.push(name);
        providers.push(provider);
    }

    providers
}
