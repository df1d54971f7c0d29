//! Trending symbol lists from Yahoo, StockTwits, headline feeds and static index
//! snapshots.

use futures_util::future::join_all;
use market_clients::yahoo::{parse_trending, trending_url};
use market_core::TextFetcher;
use news_feeds::{extract_text_tickers, parse_feed, stocktwits};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TRENDING_COUNT: u32 = 25;
pub const MAX_TRENDING_COUNT: u32 = 100;
pub const DEFAULT_PER_SOURCE: usize = 3;
pub const MAX_PER_SOURCE: usize = 10;
pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(6);

/// How many Yahoo symbols to request when Yahoo is one source among several.
const YAHOO_SOURCE_COUNT: u32 = 50;

pub const DOW_30: &[&str] = &[
    "AAPL", "AMGN", "AXP", "BA", "CAT", "CRM", "CSCO", "CVX", "DIS", "DOW", "GS", "HD", "HON", "IBM", "JNJ", "JPM", "KO",
    "MCD", "MRK", "MSFT", "NKE", "PG", "TRV", "UNH", "V", "VZ", "WBA", "WMT", "INTC", "MMM",
];

pub const NASDAQ_CORE: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "META", "GOOGL", "GOOG", "TSLA", "AVGO", "COST", "NFLX", "ADBE", "PEP", "AMD", "INTC",
    "CSCO", "QCOM", "TXN", "AMAT", "SBUX", "BKNG", "PYPL", "PDD", "MRVL", "LIN", "ADI", "INTU", "VRTX", "REGN", "MU",
    "PANW", "CRWD", "ABNB", "SNPS", "CDNS", "MAR", "KDP", "GILD", "LRCX", "KHC", "ADP", "CSX", "MDLZ", "AMGN", "HON",
    "CHTR", "MRNA", "IDXX", "ORLY", "TTD", "ZM", "TEAM", "OKTA", "DOCU", "ROKU", "SQ", "SPOT", "SNAP", "UBER", "LYFT",
];

pub const SP500_CORE: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "META", "GOOGL", "BRK.B", "LLY", "AVGO", "JPM", "TSLA", "XOM", "V", "UNH", "WMT",
    "MA", "JNJ", "PG", "ORCL", "HD", "COST", "ABBV", "BAC", "MRK", "CVX", "PEP", "KO", "ADBE", "CRM", "PFE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingSource {
    Yahoo,
    StockTwits,
    Cnbc,
    Google,
    Reuters,
    MarketWatch,
    Dow,
    Nasdaq,
    Sp500,
}

impl TrendingSource {
    /// Case-insensitive; unknown names give `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "yahoo" => Some(Self::Yahoo),
            "stocktwits" => Some(Self::StockTwits),
            "cnbc" => Some(Self::Cnbc),
            "google" => Some(Self::Google),
            "reuters" => Some(Self::Reuters),
            "marketwatch" => Some(Self::MarketWatch),
            "dow" => Some(Self::Dow),
            "nasdaq" | "nasdaq100" => Some(Self::Nasdaq),
            "sp500" => Some(Self::Sp500),
            _ => None,
        }
    }

    /// Field name in the response body.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::StockTwits => "stocktwits",
            Self::Cnbc => "cnbc",
            Self::Google => "google",
            Self::Reuters => "reuters",
            Self::MarketWatch => "marketwatch",
            Self::Dow => "dow",
            Self::Nasdaq => "nasdaq",
            Self::Sp500 => "sp500",
        }
    }

    fn feed_url(&self) -> Option<&'static str> {
        match self {
            Self::Cnbc => Some("https://www.cnbc.com/id/10001147/device/rss/rss.html"),
            Self::Google => Some("https://news.google.com/rss/search?q=stock%20market&hl=en-US&gl=US&ceid=US:en"),
            Self::Reuters => Some("https://feeds.reuters.com/reuters/businessNews"),
            Self::MarketWatch => Some("https://www.marketwatch.com/feeds/topstories"),
            _ => None,
        }
    }

    pub fn static_list(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Dow => Some(DOW_30),
            Self::Nasdaq => Some(NASDAQ_CORE),
            Self::Sp500 => Some(SP500_CORE),
            _ => None,
        }
    }
}

/// Combined `/api/trending-sources` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesSnapshot {
    pub yahoo: Vec<String>,
    pub cnbc: Vec<String>,
    pub google: Vec<String>,
    pub stocktwits: Vec<String>,
    pub reuters: Vec<String>,
    pub marketwatch: Vec<String>,
}

pub struct TrendingService {
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

impl TrendingService {
    pub fn new(fetcher: Arc<dyn TextFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Yahoo trending tickers for a region, at most `count`. Empty on failure.
    pub async fn trending(&self, region: &str, count: u32) -> Vec<String> {
        let count = count.clamp(1, MAX_TRENDING_COUNT);
        let url = match trending_url(region, count) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Bad trending region {:?}: {}", region, e);
                return Vec::new();
            }
        };

        match self.fetcher.get_text(&url, self.timeout).await {
            Ok(body) => {
                let mut symbols = parse_trending(&body);
                symbols.truncate(count as usize);
                symbols
            }
            Err(e) => {
                tracing::warn!("Yahoo trending failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Up to `per` symbols from one source.
    pub async fn from_source(&self, source: TrendingSource, region: &str, per: usize) -> Vec<String> {
        let per = per.clamp(1, MAX_PER_SOURCE);

        let mut symbols = if let Some(list) = source.static_list() {
            list.iter().map(|s| s.to_string()).collect()
        } else if let Some(url) = source.feed_url() {
            self.headline_symbols(source.key(), url).await
        } else if source == TrendingSource::StockTwits {
            self.stocktwits_symbols().await
        } else {
            self.trending(region, YAHOO_SOURCE_COUNT).await
        };

        symbols.truncate(per);
        symbols
    }

    /// All six live sources fetched in parallel.
    pub async fn all_sources(&self, region: &str, per: usize) -> SourcesSnapshot {
        let live = [
            TrendingSource::Yahoo,
            TrendingSource::Cnbc,
            TrendingSource::Google,
            TrendingSource::StockTwits,
            TrendingSource::Reuters,
            TrendingSource::MarketWatch,
        ];

        let mut lists = join_all(live.iter().map(|source| self.from_source(*source, region, per)))
            .await
            .into_iter();
        let mut next = || lists.next().unwrap_or_default();

        SourcesSnapshot {
            yahoo: next(),
            cnbc: next(),
            google: next(),
            stocktwits: next(),
            reuters: next(),
            marketwatch: next(),
        }
    }

    async fn headline_symbols(&self, name: &str, url: &str) -> Vec<String> {
        let body = match self.fetcher.get_text(url, self.timeout).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Trending feed {} failed: {}", name, e);
                return Vec::new();
            }
        };

        let mut out: Vec<String> = Vec::new();
        for item in parse_feed(&body, name) {
            let text = format!("{} {}", item.title, item.description.unwrap_or_default());
            for symbol in extract_text_tickers(&text) {
                if !out.contains(&symbol) {
                    out.push(symbol);
                }
            }
        }
        out
    }

    async fn stocktwits_symbols(&self) -> Vec<String> {
        match self.fetcher.get_text(stocktwits::TRENDING_URL, self.timeout).await {
            Ok(body) => stocktwits::parse_trending_symbols(&body),
            Err(e) => {
                tracing::warn!("StockTwits trending failed: {}", e);
                Vec::new()
            }
        }
    }
}
