use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EQUITY: &str = "EQUITY";

/// A normalized quote. Field names follow Yahoo's `quoteResponse` shape so the
/// frontend can consume any provider's output unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(rename = "regularMarketPrice", default)]
    pub price: f64,
    #[serde(rename = "regularMarketChange", default)]
    pub change: f64,
    #[serde(rename = "regularMarketChangePercent", default)]
    pub change_percent: f64,
    #[serde(rename = "regularMarketVolume", default)]
    pub volume: u64,
    #[serde(
        rename = "regularMarketPreviousClose",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_close: Option<f64>,
    #[serde(rename = "fiftyTwoWeekHigh", default, skip_serializing_if = "Option::is_none")]
    pub high_52w: Option<f64>,
    #[serde(rename = "fiftyTwoWeekLow", default, skip_serializing_if = "Option::is_none")]
    pub low_52w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    /// Only Yahoo reports an instrument type. Absent means unknown, which is not an equity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_trade_date_milliseconds: Option<i64>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_analysis: Option<TechnicalLevels>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            volume: 0,
            previous_close: None,
            high_52w: None,
            low_52w: None,
            short_name: None,
            long_name: None,
            quote_type: None,
            first_trade_date_milliseconds: None,
            source: source.into(),
            error: None,
            technical_analysis: None,
        }
    }

    /// Entry for a symbol the upstream explicitly reported as bad. Numerics stay zeroed.
    pub fn with_error(
        symbol: impl Into<String>,
        source: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let mut quote = Self::new(symbol, source);
        quote.error = Some(error.into());
        quote
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_equity(&self) -> bool {
        self.quote_type.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(EQUITY))
    }

    pub fn display_name(&self) -> Option<&str> {
        self.long_name.as_deref().or(self.short_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prediction {
    Bullish,
    Bearish,
    Neutral,
}

/// Price-derived reference levels attached to a quote. Pure arithmetic on the
/// current price; carries no forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalLevels {
    pub support_level: f64,
    pub resistance_level: f64,
    pub trend: Trend,
    pub prediction: Prediction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: f64,
    pub risk_reward_ratio: f64,
    pub confidence: f64,
    pub next_update: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One daily bar; `t` is milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenResult {
    pub symbol: String,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    pub high_52w: f64,
    pub low_52w: f64,
    pub above_50: bool,
    pub above_200: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
