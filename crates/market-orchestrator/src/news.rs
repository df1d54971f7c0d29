//! Parallel RSS and StockTwits fan-out feeding the paginated news list.

use crate::cache::TtlCache;
use chrono::Duration as ChronoDuration;
use futures_util::future::join_all;
use market_clients::build_url;
use market_core::{NewsItem, TextFetcher};
use news_feeds::{paginate, parse_feed, query_ticker_tokens, rank_pool, stocktwits, NewsPage, NewsQuery};
use std::sync::Arc;
use std::time::Duration;

pub const NEWS_POOL_TTL_SECS: i64 = 60;
const POOL_CACHE_CAPACITY: usize = 64;

/// One RSS/Atom feed in the aggregation, read in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: &'static str,
    pub url: String,
}

const STATIC_FEEDS: &[(&str, &str)] = &[
    ("CNBC", "https://www.cnbc.com/id/10001147/device/rss/rss.html"),
    ("Reuters", "https://feeds.reuters.com/reuters/businessNews"),
    (
        "Yahoo Finance",
        "https://feeds.finance.yahoo.com/rss/2.0/headline?s=%5EGSPC&region=US&lang=en-US",
    ),
    ("MarketWatch", "https://www.marketwatch.com/feeds/topstories"),
    ("Nasdaq", "https://www.nasdaq.com/feed/rssoutbound?category=Stock-Market-News"),
    ("Seeking Alpha", "https://seekingalpha.com/market_currents.xml"),
    ("Financial Times", "https://www.ft.com/rss/home"),
    ("PR Newswire", "https://www.prnewswire.com/rss/all-news.rss"),
    ("BusinessWire", "https://www.businesswire.com/portal/site/home/rss/"),
    ("SEC", "https://www.sec.gov/news/pressreleases.rss"),
];

pub fn google_news_url(query: &str) -> String {
    build_url(
        "https://news.google.com",
        &["rss", "search"],
        &[("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
    )
    .unwrap_or_else(|_| "https://news.google.com/rss/search?q=stock+market&hl=en-US&gl=US&ceid=US:en".to_string())
}

pub fn yahoo_headlines_url(symbol: &str) -> String {
    build_url(
        "https://feeds.finance.yahoo.com",
        &["rss", "2.0", "headline"],
        &[("s", symbol), ("region", "US"), ("lang", "en-US")],
    )
    .unwrap_or_else(|_| STATIC_FEEDS[2].1.to_string())
}

/// The ten fixed feeds plus Google News search for `q` (or "stock market").
pub fn feed_catalog(q: &str) -> Vec<FeedSource> {
    let mut feeds: Vec<FeedSource> = STATIC_FEEDS
        .iter()
        .map(|&(name, url)| FeedSource {
            name,
            url: url.to_string(),
        })
        .collect();

    let search = if q.trim().is_empty() { "stock market" } else { q.trim() };
    feeds.push(FeedSource {
        name: "Google News",
        url: google_news_url(search),
    });
    feeds
}

pub struct NewsAggregator {
    fetcher: Arc<dyn TextFetcher>,
    pool_cache: TtlCache<Vec<NewsItem>>,
    feed_timeout: Duration,
    us_only: bool,
}

impl NewsAggregator {
    pub fn new(fetcher: Arc<dyn TextFetcher>, feed_timeout: Duration, us_only: bool) -> Self {
        Self {
            fetcher,
            pool_cache: TtlCache::new(POOL_CACHE_CAPACITY),
            feed_timeout,
            us_only,
        }
    }

    /// One page of news. `raw_q` is the query as typed, used to spot tickers;
    /// `query` carries the normalized filters.
    ///
    /// Feed failures are logged and skipped, so total failure is an empty page.
    pub async fn page(&self, raw_q: &str, query: &NewsQuery) -> NewsPage {
        let tickers = query_ticker_tokens(raw_q);
        let mut key = query.pool_key();
        if !tickers.is_empty() {
            key.push_str(&format!("&st={}", tickers.join(",")));
        }

        let pool = match self.pool_cache.get(&key, ChronoDuration::seconds(NEWS_POOL_TTL_SECS)) {
            Some(pool) => {
                tracing::debug!("News pool cache hit for {}", key);
                pool
            }
            None => {
                let pool = self.build_pool(&query.q, &tickers, query.per_source).await;
                if !pool.is_empty() {
                    self.pool_cache.insert(key, pool.clone());
                }
                pool
            }
        };

        paginate(&pool, query)
    }

    async fn build_pool(&self, q: &str, tickers: &[String], per_source: usize) -> Vec<NewsItem> {
        let feeds = feed_catalog(q);

        let rss = join_all(feeds.iter().map(|feed| async move {
            match self.fetcher.get_text(&feed.url, self.feed_timeout).await {
                Ok(body) => {
                    let mut items = parse_feed(&body, feed.name);
                    items.truncate(per_source);
                    items
                }
                Err(e) => {
                    tracing::warn!("News feed {} failed: {}", feed.name, e);
                    Vec::new()
                }
            }
        }));

        let social = join_all(tickers.iter().map(|ticker| async move {
            match self.fetcher.get_text(&stocktwits::stream_url(ticker), self.feed_timeout).await {
                Ok(body) => {
                    let mut items = stocktwits::parse_stream(&body);
                    items.truncate(per_source);
                    items
                }
                Err(e) => {
                    tracing::warn!("StockTwits stream for {} failed: {}", ticker, e);
                    Vec::new()
                }
            }
        }));

        let (rss, social) = tokio::join!(rss, social);
        let collected: Vec<NewsItem> = rss.into_iter().chain(social).flatten().collect();
        let fetched = collected.len();

        let pool = rank_pool(collected, self.us_only);
        tracing::info!("News pool built: {} fetched, {} kept", fetched, pool.len());
        pool
    }
}
