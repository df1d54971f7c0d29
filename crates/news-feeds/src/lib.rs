//! Feed parsing and the ranking rules applied to news items.
//!
//! Everything here is synchronous and side-effect free; fetching lives in the
//! orchestrator.

pub mod context;
pub mod rank;
pub mod relevance;
pub mod rss;
pub mod stocktwits;
pub mod text;
pub mod tickers;


pub use context::{classify_query, rank_contexts, search_plan, ContextSearch, QueryKind, MAX_CONTEXT_ITEMS};
pub use rank::{dedupe_by_url, paginate, publish_ms, rank_pool, NewsPage, NewsQuery};
pub use relevance::{is_international_only, is_market_relevant};
pub use rss::{parse_feed, url_id};
pub use text::{decode_entities, strip_html};
pub use tickers::{extract_query_tickers, extract_text_tickers, query_ticker_tokens};
