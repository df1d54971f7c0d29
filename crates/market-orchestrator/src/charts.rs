//! Chart proxy: Yahoo first, Alpha Vantage daily series second.

use market_clients::alpha_vantage::{daily_series_url, parse_daily_series};
use market_clients::yahoo::chart_url;
use market_clients::YahooHost;
use market_core::{Candle, ChartEnvelope, MarketError, MarketResult, TextFetcher};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_RANGE: &str = "2y";
pub const DEFAULT_INTERVAL: &str = "1d";
pub const SCREEN_RANGE: &str = "1y";

/// Serialized chart body plus whether it is worth caching.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartReply {
    pub body: String,
    pub source: &'static str,
    pub available: bool,
}

pub struct ChartService {
    fetcher: Arc<dyn TextFetcher>,
    alpha_vantage_key: Option<String>,
    timeout: Duration,
}

impl ChartService {
    pub fn new(fetcher: Arc<dyn TextFetcher>, alpha_vantage_key: Option<String>, timeout: Duration) -> Self {
        Self {
            fetcher,
            alpha_vantage_key: alpha_vantage_key.filter(|k| !k.is_empty()),
            timeout,
        }
    }

    async fn yahoo_body(&self, symbol: &str, range: &str, interval: &str) -> MarketResult<String> {
        let url = chart_url(YahooHost::Query1, symbol, range, interval)?;
        let body = self.fetcher.get_text(&url, self.timeout).await?;
        serde_json::from_str::<Value>(&body).map_err(|e| MarketError::Parse(format!("yahoo chart: {}", e)))?;
        Ok(body)
    }

    async fn alpha_vantage_candles(&self, symbol: &str, range: &str) -> MarketResult<Vec<Candle>> {
        let key = self
            .alpha_vantage_key
            .as_deref()
            .ok_or_else(|| MarketError::Config("ALPHA_VANTAGE_KEY not set".to_string()))?;
        let url = daily_series_url(symbol, range, key)?;
        let body = self.fetcher.get_text(&url, self.timeout).await?;
        let candles = parse_daily_series(&body)?;
        if candles.is_empty() {
            return Err(MarketError::NoData(format!("No Alpha Vantage candles for {}", symbol)));
        }
        Ok(candles)
    }

    /// The Yahoo body unchanged when Yahoo answers, else the Alpha Vantage
    /// series reshaped into the same envelope, else the unavailable envelope.
    pub async fn chart(&self, symbol: &str, range: &str, interval: &str) -> ChartReply {
        match self.yahoo_body(symbol, range, interval).await {
            Ok(body) => {
                return ChartReply {
                    body,
                    source: "yahoo",
                    available: true,
                }
            }
            Err(e) => tracing::warn!("Yahoo chart for {} failed: {}", symbol, e),
        }

        let envelope = match self.alpha_vantage_candles(symbol, range).await {
            Ok(candles) => ChartEnvelope::from_candles(symbol, range, interval, &candles, "alphavantage"),
            Err(MarketError::Config(_)) => ChartEnvelope::unavailable(),
            Err(e) => {
                tracing::warn!("Alpha Vantage chart for {} failed: {}", symbol, e);
                ChartEnvelope::unavailable()
            }
        };

        let available = envelope.error.is_none();
        ChartReply {
            body: serde_json::to_string(&envelope).unwrap_or_else(|_| "{}".to_string()),
            source: if available { "alphavantage" } else { "none" },
            available,
        }
    }

    /// Ascending daily candles for screening, from whichever source answers.
    pub async fn daily_candles(&self, symbol: &str) -> MarketResult<Vec<Candle>> {
        match self.yahoo_body(symbol, SCREEN_RANGE, DEFAULT_INTERVAL).await {
            Ok(body) => {
                let candles = serde_json::from_str::<ChartEnvelope>(&body)
                    .map(|env| env.candles())
                    .unwrap_or_default();
                if !candles.is_empty() {
                    return Ok(candles);
                }
                tracing::debug!("Yahoo chart for {} had no usable closes", symbol);
            }
            Err(e) => tracing::debug!("Yahoo candles for {} failed: {}", symbol, e),
        }
        self.alpha_vantage_candles(symbol, SCREEN_RANGE).await
    }
}
