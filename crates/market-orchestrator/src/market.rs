//! Dashboard bundle of index levels and a fixed trending basket.

use crate::quotes::QuoteAggregator;
use market_core::{Quote, UPSTREAM_UNAVAILABLE};
use serde::{Deserialize, Serialize};

pub const INDICES: &[(&str, &str)] = &[
    ("^GSPC", "S&P 500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "NASDAQ"),
    ("^RUT", "Russell 2000"),
    ("^VIX", "VIX"),
    ("^TNX", "10-Year Treasury"),
];

pub const TRENDING_BASKET: &[&str] = &["NVDA", "AAPL", "TSLA", "META", "AMD", "GOOGL", "MSFT", "AMZN"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexLevel {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQuote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub indices: Vec<IndexLevel>,
    pub trending: Vec<TrendingQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarketSnapshot {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.trending.is_empty()
    }
}

fn priced(quotes: &[Quote]) -> impl Iterator<Item = &Quote> {
    quotes.iter().filter(|q| !q.is_error() && q.price > 0.0)
}

/// Both lists go through the quote chain. Nothing is synthesized: when no
/// upstream answers the lists are empty and `error` is set.
pub async fn market_snapshot(quotes: &QuoteAggregator) -> MarketSnapshot {
    let index_symbols: Vec<String> = INDICES.iter().map(|(s, _)| s.to_string()).collect();
    let basket: Vec<String> = TRENDING_BASKET.iter().map(|s| s.to_string()).collect();

    let (index_quotes, basket_quotes) = tokio::join!(quotes.fetch(&index_symbols), quotes.fetch(&basket));

    let indices = priced(index_quotes.quotes())
        .map(|q| {
            let name = INDICES
                .iter()
                .find(|(symbol, _)| *symbol == q.symbol)
                .map(|(_, name)| name.to_string())
                .or_else(|| q.display_name().map(str::to_string))
                .unwrap_or_else(|| q.symbol.clone());
            IndexLevel {
                symbol: q.symbol.clone(),
                name,
                price: q.price,
                change: q.change,
                change_percent: q.change_percent,
            }
        })
        .collect();

    let trending = priced(basket_quotes.quotes())
        .map(|q| TrendingQuote {
            symbol: q.symbol.clone(),
            price: q.price,
            change: q.change,
            change_percent: q.change_percent,
            volume: q.volume,
            source: q.source.clone(),
        })
        .collect();

    let mut snapshot = MarketSnapshot {
        indices,
        trending,
        error: None,
    };
    if snapshot.is_empty() {
        snapshot.error = Some(UPSTREAM_UNAVAILABLE.to_string());
    }
    snapshot
}
