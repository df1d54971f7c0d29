use crate::http::build_url;
use crate::per_symbol::fetch_each;
use async_trait::async_trait;
use market_core::{MarketError, MarketResult, Quote, QuoteProvider, TextFetcher};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://cloud.iexapis.com";

pub struct IexQuoteProvider {
    api_key: Option<String>,
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IexQuote {
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    latest_price: Option<f64>,
    #[serde(default)]
    change: Option<f64>,
    /// Fraction, not percent.
    #[serde(default)]
    change_percent: Option<f64>,
    #[serde(default)]
    latest_volume: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    week52_high: Option<f64>,
    #[serde(default)]
    week52_low: Option<f64>,
}

impl IexQuoteProvider {
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
            .ok_or_else(|| MarketError::Config("IEX_KEY not set".to_string()))?;
        let url = build_url(BASE_URL, &["stable", "stock", symbol, "quote"], &[("token", key)])?;
        let body = self.fetcher.get_text(&url, self.timeout).await?;
        normalize_quote(symbol, &body)
    }
}

fn normalize_quote(symbol: &str, body: &str) -> MarketResult<Option<Quote>> {
    let raw: IexQuote =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(format!("iex {}: {}", symbol, e)))?;

    let Some(price) = raw.latest_price.filter(|p| *p > 0.0) else {
        return Ok(None);
    };

    let mut quote = Quote::new(symbol, "iex");
    quote.price = price;
    quote.change = raw.change.unwrap_or(0.0);
    quote.change_percent = raw.change_percent.unwrap_or(0.0) * 100.0;
    quote.volume = raw.latest_volume.unwrap_or(0.0).max(0.0) as u64;
    quote.previous_close = raw.previous_close;
    quote.high_52w = raw.week52_high;
    quote.low_52w = raw.week52_low;
    quote.long_name = raw.company_name;
    Ok(Some(quote))
}

#[async_trait]
impl QuoteProvider for IexQuoteProvider {
    fn name(&self) -> &str {
        "iex"
    }

    fn display_name(&self) -> &str {
        "IEX Cloud"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        fetch_each(self.name(), symbols, |symbol| self.fetch_one(symbol)).await
    }
}
