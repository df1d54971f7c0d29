use crate::http::build_url;
use crate::per_symbol::fetch_each;
use async_trait::async_trait;
use market_core::{MarketError, MarketResult, Quote, QuoteProvider, TextFetcher};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://api.polygon.io";

/// Previous-session aggregates from Polygon, one request per symbol.
pub struct PolygonQuoteProvider {
    api_key: Option<String>,
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct PrevCloseResponse {
    #[serde(default)]
    results: Option<Vec<PrevBar>>,
}

#[derive(Debug, Deserialize)]
struct PrevBar {
    #[serde(default)]
    o: Option<f64>,
    #[serde(default)]
    c: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
}

impl PolygonQuoteProvider {
    pub fn new(api_key: Option<String>, fetcher: Arc<dyn TextFetcher>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            fetcher,
            timeout,
        }
    }

    async fn fetch_one(&self, symbol: &str) -> MarketResult<Option<Quote>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MarketError::Config("POLYGON_KEY not set".to_string()))?;
        let url = build_url(
            BASE_URL,
            &["v2", "aggs", "ticker", symbol, "prev"],
            &[("adjusted", "true"), ("apiKey", key)],
        )?;
        let body = self.fetcher.get_text(&url, self.timeout).await?;
        normalize_prev_close(symbol, &body)
    }
}

/// Map a `/prev` body to a quote. Change is measured against the session open.
fn normalize_prev_close(symbol: &str, body: &str) -> MarketResult<Option<Quote>> {
    let response: PrevCloseResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(format!("polygon {}: {}", symbol, e)))?;

    let Some(bar) = response.results.unwrap_or_default().into_iter().next() else {
        return Ok(None);
    };
    let Some(close) = bar.c.filter(|c| *c > 0.0) else {
        return Ok(None);
    };
    let open = bar.o.unwrap_or(close);

    let mut quote = Quote::new(symbol, "polygon");
    quote.price = close;
    quote.change = close - open;
    quote.change_percent = if open != 0.0 { (close - open) / open * 100.0 } else { 0.0 };
    quote.volume = bar.v.unwrap_or(0.0).max(0.0) as u64;
    Ok(Some(quote))
}

#[async_trait]
impl QuoteProvider for PolygonQuoteProvider {
    fn name(&self) -> &str {
        "polygon"
    }

    fn display_name(&self) -> &str {
        "Polygon.io"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        fetch_each(self.name(), symbols, |symbol| self.fetch_one(symbol)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CannedFetcher;

    #[test]
    fn normalizes_prev_close() {
        let body = r#"{"ticker":"AAPL","status":"OK","results":[{"T":"AAPL","o":100.0,"c":102.0,"h":103.0,"l":99.0,"v":5000000.0}]}"#;
        let quote = normalize_prev_close("AAPL", body).unwrap().unwrap();
        assert_eq!(quote.price, 102.0);
        assert_eq!(quote.change, 2.0);
        assert!((quote.change_percent - 2.0).abs() < 1e-9);
        assert_eq!(quote.volume, 5_000_000);
        assert_eq!(quote.source, "polygon");
    }

    #[test]
    fn empty_results_mean_no_data() {
        assert_eq!(normalize_prev_close("X", r#"{"resultsCount":0}"#).unwrap(), None);
        assert_eq!(normalize_prev_close("X", r#"{"results":[]}"#).unwrap(), None);
    }

    #[tokio::test]
    async fn unconfigured_without_key() {
        let provider = PolygonQuoteProvider::new(Some(String::new()), Arc::new(CannedFetcher::new()), Duration::from_secs(1));
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn fetches_each_symbol() {
        let fetcher = Arc::new(
            CannedFetcher::new()
                .ok("/ticker/AAPL/prev", r#"{"results":[{"o":10.0,"c":11.0,"v":1.0}]}"#)
                .ok("/ticker/MSFT/prev", r#"{"results":[{"o":20.0,"c":19.0,"v":2.0}]}"#),
        );
        let provider = PolygonQuoteProvider::new(Some("k".into()), fetcher.clone(), Duration::from_secs(1));
        let quotes = provider
            .fetch_quotes(&["AAPL".to_string(), "MSFT".to_string()])
            .await
            .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].change, -1.0);
        assert_eq!(fetcher.call_count(), 2);
    }
}
