use crate::charts::ChartService;
use crate::quotes::QuoteAggregator;
use crate::trending::{TrendingService, DEFAULT_TRENDING_COUNT, DOW_30, NASDAQ_CORE, SP500_CORE};
use futures_util::stream::{self, StreamExt};
use market_clients::yahoo::{parse_screener_symbols, screener_saved_url};
use market_core::{Quote, ScreenResult, TextFetcher};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use technical_analysis::screen_candles;

pub const MAX_SCREEN_SYMBOLS: usize = 36;
pub const SCREEN_CONCURRENCY: usize = 6;
pub const QUOTE_CHUNK: usize = 20;
pub const MAX_DEGRADED_CARDS: usize = 12;
const CATEGORY_COUNT: u32 = 50;

static RE_AI_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAI\b|Artificial|Machine Learning|NVIDIA|Palantir|Super Micro").unwrap());

/// ETFs, leveraged products, indices and crypto that trend but are not screenable.
const TRENDING_BLACKLIST: &[&str] = &[
    "SPY", "QQQ", "DIA", "IWM", "VTI", "VOO", "IVV", "ARKK", "SQQQ", "TQQQ", "UVXY", "VXX", "SPX", "^GSPC", "^IXIC",
    "^DJI", "BTC-USD", "ETH-USD",
];

fn is_blacklisted_trending(symbol: &str) -> bool {
    TRENDING_BLACKLIST.contains(&symbol) || symbol.starts_with("XL")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCategory {
    Ai,
    Growth,
    Volatile,
    Dividend,
    RecentIpo,
    MostActive,
}

impl ScreenCategory {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "AI" => Self::Ai,
            "Growth" => Self::Growth,
            "Volatile" => Self::Volatile,
            "Dividend" => Self::Dividend,
            "RecentIPO" => Self::RecentIpo,
            _ => Self::MostActive,
        }
    }

    /// Yahoo predefined screener id.
    pub fn scr_id(&self) -> &'static str {
        match self {
            Self::Ai => "technology",
            Self::Growth => "day_gainers",
            Self::Volatile => "most_volatile",
            Self::Dividend => "high_dividend_yield",
            Self::RecentIpo => "recent_ipo",
            Self::MostActive => "most_actives",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Universe {
    Symbols(Vec<String>),
    Category(ScreenCategory),
    Trending,
    Dow,
    Nasdaq,
    Sp500,
}

impl Universe {
    /// `trending`, `dow`, `nasdaq` or `sp500`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "trending" => Some(Self::Trending),
            "dow" => Some(Self::Dow),
            "nasdaq" => Some(Self::Nasdaq),
            "sp500" => Some(Self::Sp500),
            _ => None,
        }
    }
}

/// Body of `/api/screener`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenOutcome {
    pub results: Vec<ScreenResult>,
    pub universe: usize,
    pub degraded: bool,
}

/// Uppercase, dedupe and drop futures (`=F`), FX (`=X`) and crypto (`-USD`).
pub fn clean_symbols(symbols: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in symbols {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() || symbol.ends_with("=F") || symbol.ends_with("=X") || symbol.ends_with("-USD") {
            continue;
        }
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

fn degraded_card(quote: &Quote) -> ScreenResult {
    let close = if quote.price > 0.0 {
        quote.price
    } else {
        quote.previous_close.unwrap_or(0.0)
    };
    ScreenResult {
        symbol: quote.symbol.clone(),
        close,
        prev_close: quote.previous_close,
        change_pct: Some(quote.change_percent),
        high_52w: close,
        low_52w: close,
        above_50: false,
        above_200: false,
        source: Some(quote.source.clone()),
    }
}

pub struct Screener {
    quotes: Arc<QuoteAggregator>,
    charts: Arc<ChartService>,
    trending: Arc<TrendingService>,
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

impl Screener {
    pub fn new(
        quotes: Arc<QuoteAggregator>,
        charts: Arc<ChartService>,
        trending: Arc<TrendingService>,
        fetcher: Arc<dyn TextFetcher>,
        timeout: Duration,
    ) -> Self {
        Self {
            quotes,
            charts,
            trending,
            fetcher,
            timeout,
        }
    }

    /// Quotes for the cleaned list, fetched in chunks no larger than the
    /// aggregator's symbol cap. Only error-free quotes.
    async fn lookup_quotes(&self, symbols: &[String]) -> Vec<Quote> {
        let chunk_size = QUOTE_CHUNK.min(self.quotes.symbol_cap()).max(1);
        let mut quotes = Vec::new();
        for chunk in symbols.chunks(chunk_size) {
            let response = self.quotes.fetch(chunk).await;
            quotes.extend(response.quote_response.result.into_iter().filter(|q| !q.is_error()));
        }
        quotes
    }

    /// Keep equities only. When no quote came back at all the cleaned list is
    /// used as-is, capped at one chunk.
    pub async fn equity_filter(&self, symbols: &[String]) -> (Vec<String>, Vec<Quote>) {
        let cleaned = clean_symbols(symbols);
        let quotes = self.lookup_quotes(&cleaned).await;
        if quotes.is_empty() {
            return (cleaned.into_iter().take(QUOTE_CHUNK).collect(), quotes);
        }

        let equities = quotes.iter().filter(|q| q.is_equity()).map(|q| q.symbol.clone()).collect();
        (equities, quotes)
    }

    pub async fn universe_symbols(&self, universe: &Universe) -> Vec<String> {
        let to_strings = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match universe {
            Universe::Symbols(symbols) => symbols.clone(),
            Universe::Dow => to_strings(DOW_30),
            Universe::Nasdaq => to_strings(NASDAQ_CORE),
            Universe::Sp500 => to_strings(SP500_CORE),
            Universe::Trending => self
                .trending
                .trending("US", DEFAULT_TRENDING_COUNT)
                .await
                .into_iter()
                .filter(|s| !is_blacklisted_trending(s))
                .collect(),
            Universe::Category(category) => self.category_symbols(*category).await,
        }
    }

    async fn category_symbols(&self, category: ScreenCategory) -> Vec<String> {
        let url = match screener_saved_url(category.scr_id(), CATEGORY_COUNT) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Screener url for {:?}: {}", category, e);
                return Vec::new();
            }
        };
        match self.fetcher.get_text(&url, self.timeout).await {
            Ok(body) => parse_screener_symbols(&body),
            Err(e) => {
                tracing::warn!("Yahoo screener {} failed: {}", category.scr_id(), e);
                Vec::new()
            }
        }
    }

    /// Narrow a category's quotes with its name or listing-date rule.
    fn apply_category(category: ScreenCategory, mut quotes: Vec<Quote>) -> Vec<Quote> {
        match category {
            ScreenCategory::Ai => {
                quotes.retain(|q| q.display_name().is_some_and(|name| RE_AI_NAME.is_match(name)));
                quotes
            }
            ScreenCategory::RecentIpo => {
                quotes.retain(|q| q.first_trade_date_milliseconds.is_some());
                quotes.sort_by_key(|q| std::cmp::Reverse(q.first_trade_date_milliseconds));
                quotes
            }
            _ => quotes,
        }
    }

    /// Resolve the universe, filter to equities, then screen.
    pub async fn run(&self, universe: &Universe) -> ScreenOutcome {
        let symbols = self.universe_symbols(universe).await;
        let (mut equities, quotes) = self.equity_filter(&symbols).await;

        if let Universe::Category(category @ (ScreenCategory::Ai | ScreenCategory::RecentIpo)) = universe {
            let kept = Self::apply_category(*category, quotes.clone());
            equities = kept.iter().filter(|q| q.is_equity()).map(|q| q.symbol.clone()).collect();
        }

        self.screen(&equities, &quotes).await
    }

    /// Screen up to 36 symbols, six at a time, keeping input order. Falls back
    /// to quote cards when nothing could be screened.
    pub async fn screen(&self, symbols: &[String], quotes: &[Quote]) -> ScreenOutcome {
        let batch: Vec<String> = symbols.iter().take(MAX_SCREEN_SYMBOLS).cloned().collect();
        let universe = batch.len();

        let results: Vec<ScreenResult> = stream::iter(batch.iter().cloned())
            .map(|symbol| async move {
                let candles = match self.charts.daily_candles(&symbol).await {
                    Ok(candles) => candles,
                    Err(e) => {
                        tracing::debug!("No candles for {}: {}", symbol, e);
                        return None;
                    }
                };
                match screen_candles(&symbol, &candles) {
                    Ok(result) => Some(result),
                    Err(e) => {
                        tracing::debug!("Skipping {}: {}", symbol, e);
                        None
                    }
                }
            })
            .buffered(SCREEN_CONCURRENCY)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        if !results.is_empty() || universe == 0 {
            return ScreenOutcome {
                results,
                universe,
                degraded: false,
            };
        }

        tracing::warn!("Screening produced nothing for {} symbols, using quote cards", universe);
        let cards = batch
            .iter()
            .filter_map(|symbol| quotes.iter().find(|q| &q.symbol == symbol))
            .take(MAX_DEGRADED_CARDS)
            .map(degraded_card)
            .collect();

        ScreenOutcome {
            results: cards,
            universe,
            degraded: true,
        }
    }
}
