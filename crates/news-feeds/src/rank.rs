//! Dedupe, recency sort and pagination over the aggregated news pool.

use crate::relevance::{is_international_only, is_market_relevant};
use chrono::DateTime;
use market_core::NewsItem;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 25;
pub const DEFAULT_PER_SOURCE: usize = 12;
pub const MIN_PER_SOURCE: usize = 3;
pub const MAX_PER_SOURCE: usize = 20;

/// Milliseconds since epoch for a feed date, or 0 when it cannot be parsed.
pub fn publish_ms(published_at: Option<&str>) -> i64 {
    let Some(raw) = published_at.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0;
    };
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Keep the first item seen for every URL.
pub fn dedupe_by_url(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.url.is_empty() && seen.insert(item.url.clone()))
        .collect()
}

/// Dedupe, sort newest first (stable for equal dates) and drop off-topic titles.
pub fn rank_pool(items: Vec<NewsItem>, us_only: bool) -> Vec<NewsItem> {
    let mut pool = dedupe_by_url(items);
    pool.sort_by_key(|item| Reverse(publish_ms(item.published_at.as_deref())));
    pool.retain(|item| is_market_relevant(&item.title) && !(us_only && is_international_only(&item.title)));
    pool
}

/// Normalized `/api/news` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub page: usize,
    pub page_size: usize,
    /// Trimmed and lowercased; empty means no filter.
    pub q: String,
    pub source: Option<String>,
    pub per_source: usize,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            q: String::new(),
            source: None,
            per_source: DEFAULT_PER_SOURCE,
        }
    }
}

impl NewsQuery {
    /// Build from raw query-string values, clamping numbers and falling back to
    /// defaults when they do not parse.
    pub fn from_params(
        page: Option<&str>,
        page_size: Option<&str>,
        q: Option<&str>,
        source: Option<&str>,
        per_source: Option<&str>,
    ) -> Self {
        fn number(raw: Option<&str>, default: usize) -> usize {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .map(|n| n.max(0) as usize)
                .unwrap_or(default)
        }

        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "All")
            .map(str::to_string);

        Self {
            page: number(page, 1).max(1),
            page_size: number(page_size, DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            q: q.unwrap_or_default().trim().to_lowercase(),
            source,
            per_source: number(per_source, DEFAULT_PER_SOURCE).clamp(MIN_PER_SOURCE, MAX_PER_SOURCE),
        }
    }

    /// Cache key for the unfiltered pool. `q` picks the feeds and `per_source`
    /// bounds how many items each contributes.
    pub fn pool_key(&self) -> String {
        if self.q.is_empty() {
            format!("news?per={}", self.per_source)
        } else {
            format!("news?q={}&per={}", self.q, self.per_source)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsPage {
    pub items: Vec<NewsItem>,
    pub total: usize,
}

/// Apply the source and title filters, then slice out the requested page.
pub fn paginate(pool: &[NewsItem], query: &NewsQuery) -> NewsPage {
    let filtered: Vec<&NewsItem> = pool
        .iter()
        .filter(|item| query.source.as_deref().is_none_or(|s| item.source == s))
        .filter(|item| query.q.is_empty() || item.title.to_lowercase().contains(&query.q))
        .collect();

    let total = filtered.len();
    let start = (query.page - 1).saturating_mul(query.page_size).min(total);
    let end = (start + query.page_size).min(total);

    NewsPage {
        items: filtered[start..end].iter().map(|item| (*item).clone()).collect(),
        total,
    }
}
