use crate::http::build_url;
use crate::per_symbol::{fetch_each, parse_number};
use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{Candle, MarketError, MarketResult, Quote, QuoteProvider, TextFetcher};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// The free tier allows only a handful of calls per minute.
const MAX_SYMBOLS_PER_REQUEST: usize = 5;

const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

pub struct AlphaVantageQuoteProvider {
    api_key: Option<String>,
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

impl AlphaVantageQuoteProvider {
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
            .ok_or_else(|| MarketError::Config("ALPHA_VANTAGE_KEY not set".to_string()))?;
        let url = build_url(
            BASE_URL,
            &[],
            &[("function", "GLOBAL_QUOTE"), ("symbol", symbol), ("apikey", key)],
        )?;
        let body = self.fetcher.get_text(&url, self.timeout).await?;
        normalize_global_quote(symbol, &body)
    }
}

/// Alpha Vantage reports errors and throttling inside a 200 body.
fn check_body(json: &Value) -> MarketResult<()> {
    if let Some(note) = json.get("Note").or_else(|| json.get("Information")) {
        tracing::debug!("Alpha Vantage throttle notice: {}", note);
        return Err(MarketError::RateLimited {
            provider: "alphavantage".to_string(),
        });
    }
    if let Some(error) = json.get("Error Message") {
        return Err(MarketError::NoData(format!("Alpha Vantage error: {}", error)));
    }
    Ok(())
}

fn normalize_global_quote(symbol: &str, body: &str) -> MarketResult<Option<Quote>> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| MarketError::Parse(format!("alphavantage {}: {}", symbol, e)))?;
    match check_body(&json) {
        Err(MarketError::NoData(_)) => return Ok(None),
        other => other?,
    }

    let Some(fields) = json.get("Global Quote").and_then(|v| v.as_object()) else {
        return Ok(None);
    };
    let field = |name: &str| parse_number(fields.get(name).and_then(|v| v.as_str()));

    let Some(price) = field("05. price").filter(|p| *p > 0.0) else {
        return Ok(None);
    };

    let mut quote = Quote::new(symbol, "alphavantage");
    quote.price = price;
    quote.change = field("09. change").unwrap_or(0.0);
    quote.change_percent = field("10. change percent").unwrap_or(0.0);
    quote.volume = field("06. volume").unwrap_or(0.0).max(0.0) as u64;
    quote.previous_close = field("08. previous close");
    Ok(Some(quote))
}

#[async_trait]
impl QuoteProvider for AlphaVantageQuoteProvider {
    fn name(&self) -> &str {
        "alphavantage"
    }

    fn display_name(&self) -> &str {
        "Alpha Vantage"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        let capped = &symbols[..symbols.len().min(MAX_SYMBOLS_PER_REQUEST)];
        fetch_each(self.name(), capped, |symbol| self.fetch_one(symbol)).await
    }
}

/// `outputsize` for a chart range: long ranges need the full history.
pub fn output_size_for_range(range: &str) -> &'static str {
    match range {
        "5y" | "10y" | "max" => "full",
        _ => "compact",
    }
}

pub fn daily_series_url(symbol: &str, range: &str, api_key: &str) -> MarketResult<String> {
    build_url(
        BASE_URL,
        &[],
        &[
            ("function", "TIME_SERIES_DAILY_ADJUSTED"),
            ("symbol", symbol),
            ("outputsize", output_size_for_range(range)),
            ("apikey", api_key),
        ],
    )
}

/// Parse the `{date: {"1. open": ..}}` map into ascending daily candles.
pub fn parse_daily_series(body: &str) -> MarketResult<Vec<Candle>> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(format!("alphavantage daily: {}", e)))?;
    check_body(&json)?;

    let series = json
        .get(DAILY_SERIES_KEY)
        .and_then(|v| v.as_object())
        .ok_or_else(|| MarketError::NoData("No daily series in Alpha Vantage response".to_string()))?;

    let mut candles = Vec::with_capacity(series.len());
    for (date, values) in series {
        let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            continue;
        };
        let Some(ts) = day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis()) else {
            continue;
        };
        let field = |name: &str| parse_number(values.get(name).and_then(|v| v.as_str()));
        let Some(close) = field("4. close") else {
            continue;
        };

        candles.push(Candle {
            t: ts,
            o: field("1. open").unwrap_or(close),
            h: field("2. high").unwrap_or(close),
            l: field("3. low").unwrap_or(close),
            c: close,
            v: field("6. volume").or_else(|| field("5. volume")),
        });
    }

    candles.sort_by_key(|c| c.t);
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CannedFetcher;

    #[test]
    fn normalizes_global_quote() {
        let body = r#"{"Global Quote":{"01. symbol":"IBM","05. price":"189.2500","06. volume":"3200000",
            "08. previous close":"190.0000","09. change":"-0.7500","10. change percent":"-0.3947%"}}"#;
        let quote = normalize_global_quote("IBM", body).unwrap().unwrap();
        assert_eq!(quote.price, 189.25);
        assert_eq!(quote.change, -0.75);
        assert_eq!(quote.change_percent, -0.3947);
        assert_eq!(quote.volume, 3_200_000);
        assert_eq!(quote.previous_close, Some(190.0));
    }

    #[test]
    fn note_means_rate_limited() {
        let body = r#"{"Note":"Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;
        let err = normalize_global_quote("IBM", body).unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn empty_global_quote_is_no_data() {
        assert_eq!(normalize_global_quote("ZZZZ", r#"{"Global Quote":{}}"#).unwrap(), None);
        assert_eq!(
            normalize_global_quote("ZZZZ", r#"{"Error Message":"Invalid API call"}"#).unwrap(),
            None
        );
    }

    #[test]
    fn daily_series_sorted_ascending() {
        let body = r#"{"Meta Data":{},"Time Series (Daily)":{
            "2024-01-03":{"1. open":"3","2. high":"4","3. low":"2","4. close":"3.5","6. volume":"300"},
            "2024-01-01":{"1. open":"1","2. high":"2","3. low":"0.5","4. close":"1.5","6. volume":"100"},
            "2024-01-02":{"1. open":"2","2. high":"3","3. low":"1","4. close":"2.5","6. volume":"200"}}}"#;
        let candles = parse_daily_series(body).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].c, 1.5);
        assert_eq!(candles[2].c, 3.5);
        assert_eq!(candles[0].t, 1_704_067_200_000);
        assert_eq!(candles[1].v, Some(200.0));
    }

    #[test]
    fn output_size_by_range() {
        assert_eq!(output_size_for_range("5y"), "full");
        assert_eq!(output_size_for_range("10y"), "full");
        assert_eq!(output_size_for_range("2y"), "compact");
    }

    #[tokio::test]
    async fn only_first_five_symbols_requested() {
        let fetcher = Arc::new(CannedFetcher::new().ok(
            "GLOBAL_QUOTE",
            r#"{"Global Quote":{"05. price":"10.0"}}"#,
        ));
        let provider = AlphaVantageQuoteProvider::new(Some("k".into()), fetcher.clone(), Duration::from_secs(1));
        let symbols: Vec<String> = ["A", "B", "C", "D", "E", "F", "G"].iter().map(|s| s.to_string()).collect();
        let quotes = provider.fetch_quotes(&symbols).await.unwrap();
        assert_eq!(quotes.len(), 5);
        assert_eq!(fetcher.call_count(), 5);
    }
}
