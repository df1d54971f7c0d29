//! Finance context lookup for chat prompts: what to search for a question, and
//! how to rank what comes back.

use crate::rank::{dedupe_by_url, publish_ms};
use crate::tickers::extract_query_tickers;
use chrono::{DateTime, Utc};
use market_core::NewsItem;
use regex::Regex;
use std::sync::LazyLock;

macro_rules! re {
    ($pat:expr) => {
        LazyLock::new(|| Regex::new($pat).unwrap())
    };
}

static RE_TICKER_TITLE: LazyLock<Regex> = re!(r"(?i)STOCK|SHARE|PRICE|TRADING|VOLUME");
static RE_FED_TITLE: LazyLock<Regex> = re!(r"(?i)FED|FEDERAL|POWELL|FOMC|RATE|INTEREST");
static RE_EARNINGS_TITLE: LazyLock<Regex> = re!(r"(?i)EARNINGS|QUARTERLY|RESULTS|REVENUE|PROFIT");
static RE_MARKET_TITLE: LazyLock<Regex> = re!(r"(?i)MARKET|SECTOR|INDEX|TREND");
static RE_INFLATION_TITLE: LazyLock<Regex> = re!(r"(?i)INFLATION|CPI|PRICE|ECONOMIC");

pub const MAX_CONTEXT_ITEMS: usize = 12;
const MAX_TICKER_SEARCHES: usize = 3;

const PREFERRED_DOMAINS: &[&str] = &[
    "reuters.com",
    "cnbc.com",
    "finance.yahoo.com",
    "bloomberg.com",
    "marketwatch.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Ticker,
    Fed,
    Earnings,
    Market,
    Economic,
    General,
}

/// One upstream lookup the context search should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSearch {
    GoogleNews(String),
    YahooHeadlines(String),
    CnbcTop,
    StockTwits(String),
}

fn mentions_any(lowered: &str, words: &[&str]) -> bool {
    words.iter().any(|w| lowered.contains(w))
}

fn is_fed_query(lowered: &str) -> bool {
    mentions_any(lowered, &["powell", "fed", "fomc", "federal reserve"])
}

/// Ticker questions win over topic keywords; topics are checked in a fixed order.
pub fn classify_query(query: &str, tickers: &[String]) -> QueryKind {
    let lowered = query.to_lowercase();
    if !tickers.is_empty() {
        QueryKind::Ticker
    } else if is_fed_query(&lowered) {
        QueryKind::Fed
    } else if mentions_any(&lowered, &["earnings", "quarterly", "results"]) {
        QueryKind::Earnings
    } else if mentions_any(&lowered, &["market", "sector", "trend"]) {
        QueryKind::Market
    } else if mentions_any(&lowered, &["inflation", "cpi", "jobs", "employment"]) {
        QueryKind::Economic
    } else {
        QueryKind::General
    }
}

/// The searches to run for a question, in order.
pub fn search_plan(query: &str) -> (Vec<String>, Vec<ContextSearch>) {
    let tickers = extract_query_tickers(query);
    let kind = classify_query(query, &tickers);

    let plan = match kind {
        QueryKind::Ticker => tickers
            .iter()
            .take(MAX_TICKER_SEARCHES)
            .flat_map(|t| {
                [
                    ContextSearch::YahooHeadlines(t.clone()),
                    ContextSearch::StockTwits(t.clone()),
                    ContextSearch::GoogleNews(format!("{} stock news when:1d", t)),
                ]
            })
            .collect(),
        QueryKind::Fed => vec![
            ContextSearch::GoogleNews("Federal Reserve Powell speech when:1d".to_string()),
            ContextSearch::GoogleNews("FOMC meeting when:1d".to_string()),
            ContextSearch::CnbcTop,
        ],
        QueryKind::Earnings => vec![
            ContextSearch::GoogleNews("earnings results when:1d".to_string()),
            ContextSearch::YahooHeadlines("^GSPC".to_string()),
        ],
        QueryKind::Market => vec![
            ContextSearch::GoogleNews("stock market today when:1d".to_string()),
            ContextSearch::CnbcTop,
            ContextSearch::YahooHeadlines("^GSPC".to_string()),
        ],
        QueryKind::Economic => vec![
            ContextSearch::GoogleNews("inflation CPI jobs economic data when:1d".to_string()),
            ContextSearch::GoogleNews("Federal Reserve economic when:1d".to_string()),
        ],
        QueryKind::General => {
            let sites = PREFERRED_DOMAINS[..4]
                .iter()
                .map(|s| format!("site:{}", s))
                .collect::<Vec<_>>()
                .join(" OR ");
            vec![
                ContextSearch::GoogleNews(format!("{} finance when:1d ({})", query.trim(), sites)),
                ContextSearch::CnbcTop,
            ]
        }
    };

    (tickers, plan)
}

fn score(item: &NewsItem, query_upper: &str, tickers: &[String], kind: QueryKind, fed: bool, now: DateTime<Utc>) -> i32 {
    let title = item.title.to_uppercase();
    let mut score = 0;

    score += 5 * tickers.iter().filter(|t| title.contains(t.as_str())).count() as i32;

    if kind == QueryKind::Ticker && RE_TICKER_TITLE.is_match(&title) {
        score += 3;
    }
    if fed && RE_FED_TITLE.is_match(&title) {
        score += 4;
    }
    if query_upper.contains("EARNINGS") && RE_EARNINGS_TITLE.is_match(&title) {
        score += 3;
    }
    if query_upper.contains("MARKET") && RE_MARKET_TITLE.is_match(&title) {
        score += 2;
    }
    if query_upper.contains("INFLATION") && RE_INFLATION_TITLE.is_match(&title) {
        score += 3;
    }

    if PREFERRED_DOMAINS.iter().any(|d| item.url.contains(d)) {
        score += 2;
    }

    let published = publish_ms(item.published_at.as_deref());
    if published > 0 {
        let hours = (now.timestamp_millis() - published) as f64 / 3_600_000.0;
        score += if hours <= 6.0 {
            4
        } else if hours <= 24.0 {
            3
        } else if hours <= 72.0 {
            2
        } else {
            0
        };
    }

    score
}

/// Dedupe, order by relevance to the question (stable on ties) and keep the top items.
pub fn rank_contexts(items: Vec<NewsItem>, query: &str, tickers: &[String], now: DateTime<Utc>) -> Vec<NewsItem> {
    let kind = classify_query(query, tickers);
    let fed = is_fed_query(&query.to_lowercase());
    let query_upper = query.to_uppercase();

    let mut scored: Vec<(i32, NewsItem)> = dedupe_by_url(items)
        .into_iter()
        .map(|item| (score(&item, &query_upper, tickers, kind, fed, now), item))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored.into_iter().take(MAX_CONTEXT_ITEMS).map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(url: &str, title: &str, published: Option<&str>) -> NewsItem {
        NewsItem {
            id: crate::url_id(url),
            title: title.to_string(),
            url: url.to_string(),
            source: "Google News".to_string(),
            published_at: published.map(str::to_string),
            description: None,
        }
    }

    #[test]
    fn classification_order() {
        assert_eq!(classify_query("what did powell say", &[]), QueryKind::Fed);
        assert_eq!(classify_query("quarterly results season", &[]), QueryKind::Earnings);
        assert_eq!(classify_query("sector rotation", &[]), QueryKind::Market);
        assert_eq!(classify_query("cpi print", &[]), QueryKind::Economic);
        assert_eq!(classify_query("what to buy", &[]), QueryKind::General);
        assert_eq!(classify_query("fed and TSLA", &["TSLA".to_string()]), QueryKind::Ticker);
    }

    #[test]
    fn ticker_plan_fans_out_per_symbol() {
        let (tickers, plan) = search_plan("thoughts on $nvda and Tesla");
        assert_eq!(tickers, vec!["TSLA", "NVDA"]);
        assert_eq!(plan.len(), 6);
        assert_eq!(plan[0], ContextSearch::YahooHeadlines("TSLA".to_string()));
        assert_eq!(plan[1], ContextSearch::StockTwits("TSLA".to_string()));
        assert_eq!(plan[2], ContextSearch::GoogleNews("TSLA stock news when:1d".to_string()));
    }

    #[test]
    fn general_plan_restricts_sites() {
        let (_, plan) = search_plan("what should I watch this week");
        match &plan[0] {
            ContextSearch::GoogleNews(q) => {
                assert!(q.starts_with("what should I watch this week finance when:1d ("));
                assert!(q.contains("site:reuters.com OR site:cnbc.com"));
            }
            other => panic!("unexpected first search {:?}", other),
        }
        assert_eq!(plan[1], ContextSearch::CnbcTop);
    }

    #[test]
    fn ranking_prefers_ticker_hits_and_recency() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let items = vec![
            item("https://blog.example/1", "Markets wrap", Some("2024-04-01T00:00:00Z")),
            item("https://www.reuters.com/tsla", "TSLA shares climb", Some("2024-05-01T10:00:00Z")),
            item("https://blog.example/2", "TSLA chatter", None),
            item("https://blog.example/1", "duplicate", None),
        ];
        let ranked = rank_contexts(items, "TSLA", &["TSLA".to_string()], now);
        let urls: Vec<&str> = ranked.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://www.reuters.com/tsla", "https://blog.example/2", "https://blog.example/1"]
        );
    }

    #[test]
    fn keeps_at_most_twelve() {
        let now = Utc::now();
        let items = (0..20).map(|i| item(&format!("https://x/{}", i), "News", None)).collect();
        assert_eq!(rank_contexts(items, "anything", &[], now).len(), MAX_CONTEXT_ITEMS);
    }
}
