use crate::http::build_url;
use crate::per_symbol::fetch_each;
use async_trait::async_trait;
use market_core::{MarketError, MarketResult, Quote, QuoteProvider, TextFetcher};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const QUOTE_URL: &str = "https://finnhub.io/api/v1/quote";

pub struct FinnhubQuoteProvider {
    api_key: Option<String>,
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct FinnhubQuote {
    #[serde(default)]
    c: Option<f64>,
    #[serde(default)]
    d: Option<f64>,
    #[serde(default)]
    dp: Option<f64>,
    #[serde(default)]
    pc: Option<f64>,
}

impl FinnhubQuoteProvider {
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
            .ok_or_else(|| MarketError::Config("FINNHUB_KEY not set".to_string()))?;
        let url = build_url(QUOTE_URL, &[], &[("symbol", symbol), ("token", key)])?;
        let body = self.fetcher.get_text(&url, self.timeout).await?;
        normalize_quote(symbol, &body)
    }
}

/// Finnhub answers unknown symbols with all-zero fields, so `c == 0` is no data.
fn normalize_quote(symbol: &str, body: &str) -> MarketResult<Option<Quote>> {
    let raw: FinnhubQuote =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(format!("finnhub {}: {}", symbol, e)))?;

    let Some(price) = raw.c.filter(|c| *c != 0.0) else {
        return Ok(None);
    };

    let mut quote = Quote::new(symbol, "finnhub");
    quote.price = price;
    quote.change = raw.d.unwrap_or(0.0);
    quote.change_percent = raw.dp.unwrap_or(0.0);
    quote.previous_close = raw.pc;
    Ok(Some(quote))
}

#[async_trait]
impl QuoteProvider for FinnhubQuoteProvider {
    fn name(&self) -> &str {
        "finnhub"
    }

    fn display_name(&self) -> &str {
        "Finnhub"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        fetch_each(self.name(), symbols, |symbol| self.fetch_one(symbol)).await
    }
}
