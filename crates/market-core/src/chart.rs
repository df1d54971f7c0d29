//! Yahoo-shaped chart envelope.
//!
//! Every field is optional on the way in so that upstream schema drift degrades
//! to an empty series instead of a parse failure.

use crate::Candle;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub chart: ChartBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<ChartResult>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartIndicators {
    #[serde(default, deserialize_with = "null_as_default")]
    pub quote: Vec<OhlcArrays>,
}

/// Parallel per-bar arrays; Yahoo uses `null` for missing bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhlcArrays {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChartEnvelope {
    /// The empty envelope returned when no chart source could answer.
    pub fn unavailable() -> Self {
        Self {
            chart: ChartBody::default(),
            error: Some(UPSTREAM_UNAVAILABLE.to_string()),
            source: None,
        }
    }

    /// Build a single-series envelope from ascending candles.
    pub fn from_candles(symbol: &str, range: &str, interval: &str, candles: &[Candle], source: &str) -> Self {
        let mut arrays = OhlcArrays::default();
        let mut timestamp = Vec::with_capacity(candles.len());
        for candle in candles {
            timestamp.push(candle.t / 1000);
            arrays.open.push(Some(candle.o));
            arrays.high.push(Some(candle.h));
            arrays.low.push(Some(candle.l));
            arrays.close.push(Some(candle.c));
            arrays.volume.push(candle.v);
        }

        Self {
            chart: ChartBody {
                result: vec![ChartResult {
                    meta: serde_json::json!({
                        "symbol": symbol,
                        "range": range,
                        "dataGranularity": interval,
                    }),
                    timestamp,
                    indicators: ChartIndicators { quote: vec![arrays] },
                }],
                error: None,
            },
            error: None,
            source: Some(source.to_string()),
        }
    }

    /// Flatten the first series into candles. Bars without a finite close are
    /// skipped; missing open/high/low fall back to the close.
    pub fn candles(&self) -> Vec<Candle> {
        let Some(series) = self.chart.result.first() else {
            return Vec::new();
        };
        let Some(arrays) = series.indicators.quote.first() else {
            return Vec::new();
        };

        let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten().filter(|v| v.is_finite());

        series
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let close = at(&arrays.close, i)?;
                Some(Candle {
                    t: ts * 1000,
                    o: at(&arrays.open, i).unwrap_or(close),
                    h: at(&arrays.high, i).unwrap_or(close),
                    l: at(&arrays.low, i).unwrap_or(close),
                    c: close,
                    v: at(&arrays.volume, i),
                })
            })
            .collect()
    }
}
