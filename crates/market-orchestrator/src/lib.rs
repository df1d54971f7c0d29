//! Request pipelines: provider fallback for quotes, feed fan-out for news, chart
//! fallback, screening, trending lists and the supporting caches.
//!
//! Every pipeline talks to the outside world only through the `market-core`
//! traits, so tests drive them with in-process fakes.

pub mod cache;
pub mod calendar;
pub mod charts;
pub mod context;
pub mod market;
pub mod news;
pub mod quotes;
pub mod reader;
pub mod screener;
pub mod trending;

#[cfg(test)]
mod pipeline_tests;

pub use cache::TtlCache;
pub use calendar::CalendarService;
pub use charts::{ChartReply, ChartService, DEFAULT_INTERVAL, DEFAULT_RANGE};
pub use context::ContextSearchService;
pub use market::{market_snapshot, MarketSnapshot};
pub use news::{feed_catalog, FeedSource, NewsAggregator};
pub use quotes::{parse_symbols, AttemptCode, QuoteAggregator, QuoteResponse, QuoteStatus, SourceError};
pub use reader::ArticleReader;
pub use screener::{clean_symbols, ScreenCategory, ScreenOutcome, Screener, Universe};
pub use trending::{SourcesSnapshot, TrendingService, TrendingSource};
