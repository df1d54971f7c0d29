//! Finance headlines relevant to a chat question, cached per question.

use crate::cache::TtlCache;
use crate::news::{google_news_url, yahoo_headlines_url};
use chrono::{Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use market_core::{NewsItem, TextFetcher};
use news_feeds::{parse_feed, rank_contexts, search_plan, stocktwits, ContextSearch};
use std::sync::Arc;
use std::time::Duration;

pub const CONTEXT_TTL_SECS: i64 = 300;
pub const CONTEXT_CACHE_CAPACITY: usize = 50;
const ITEMS_PER_SEARCH: usize = 10;
const CNBC_TOP_URL: &str = "https://www.cnbc.com/id/100003114/device/rss/rss.html";

pub struct ContextSearchService {
    fetcher: Arc<dyn TextFetcher>,
    cache: TtlCache<Vec<NewsItem>>,
    timeout: Duration,
}

impl ContextSearchService {
    pub fn new(fetcher: Arc<dyn TextFetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            cache: TtlCache::new(CONTEXT_CACHE_CAPACITY),
            timeout,
        }
    }

    /// Up to twelve ranked items for `query`. Blank queries give nothing.
    pub async fn search(&self, query: &str) -> Vec<NewsItem> {
        let key = query.trim().to_lowercase();
        if key.is_empty() {
            return Vec::new();
        }

        if let Some(items) = self.cache.get(&key, ChronoDuration::seconds(CONTEXT_TTL_SECS)) {
            tracing::debug!("Context cache hit for {:?}", key);
            return items;
        }

        let (tickers, plan) = search_plan(query);
        let batches = join_all(plan.iter().map(|search| self.run(search))).await;
        let ranked = rank_contexts(batches.into_iter().flatten().collect(), query, &tickers, Utc::now());

        if !ranked.is_empty() {
            self.cache.insert(key, ranked.clone());
        }
        ranked
    }

    async fn run(&self, search: &ContextSearch) -> Vec<NewsItem> {
        let (url, source) = match search {
            ContextSearch::GoogleNews(q) => (google_news_url(q), "Google News"),
            ContextSearch::YahooHeadlines(symbol) => (yahoo_headlines_url(symbol), "Yahoo Finance"),
            ContextSearch::CnbcTop => (CNBC_TOP_URL.to_string(), "CNBC"),
            ContextSearch::StockTwits(symbol) => (stocktwits::stream_url(symbol), stocktwits::SOURCE_NAME),
        };

        let body = match self.fetcher.get_text(&url, self.timeout).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Context search {:?} failed: {}", search, e);
                return Vec::new();
            }
        };

        let mut items = match search {
            ContextSearch::StockTwits(_) => stocktwits::parse_stream(&body),
            _ => parse_feed(&body, source),
        };
        items.truncate(ITEMS_PER_SEARCH);
        items
    }
}
