use market_core::TextFetcher;
use serde_json::Value;
use std::time::Duration;

/// Tried in order; the first one answering with JSON wins.
pub const IPO_CALENDAR_URLS: &[&str] = &[
    "https://api.nasdaq.com/api/ipo/calendar",
    "https://www.nasdaq.com/api/v3/calendar/ipos",
];

/// Raw JSON body of the IPO calendar, or `None` when every endpoint failed.
pub async fn fetch_ipo_calendar(fetcher: &dyn TextFetcher, timeout: Duration) -> Option<String> {
    for url in IPO_CALENDAR_URLS {
        match fetcher.get_text(url, timeout).await {
            Ok(body) if serde_json::from_str::<Value>(&body).is_ok() => return Some(body),
            Ok(_) => tracing::warn!("IPO calendar at {} returned a non-JSON body", url),
            Err(e) => tracing::warn!("IPO calendar at {} failed: {}", url, e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CannedFetcher;
    use market_core::MarketError;

    #[tokio::test]
    async fn falls_through_to_second_endpoint() {
        let fetcher = CannedFetcher::new()
            .err("api.nasdaq.com", MarketError::Http { status: 403, url: "x".into() })
            .ok("www.nasdaq.com", r#"{"data":{"upcoming":[]}}"#);
        let body = fetch_ipo_calendar(&fetcher, Duration::from_secs(1)).await;
        assert_eq!(body.as_deref(), Some(r#"{"data":{"upcoming":[]}}"#));
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn html_bodies_do_not_count() {
        let fetcher = CannedFetcher::new()
            .ok("api.nasdaq.com", "<html>blocked</html>")
            .err("www.nasdaq.com", MarketError::Timeout("x".into()));
        assert_eq!(fetch_ipo_calendar(&fetcher, Duration::from_secs(1)).await, None);
    }
}
