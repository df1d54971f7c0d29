use chrono::NaiveDate;
use market_clients::yahoo::{
    calendar_url, parse_calendar_earnings, parse_calendar_economic_events, week_bounds, EconomicEvent,
};
use market_core::TextFetcher;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// This week's Yahoo calendar (Sunday..Saturday), split into earnings rows and
/// economic events.
pub struct CalendarService {
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

impl CalendarService {
    pub fn new(fetcher: Arc<dyn TextFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    async fn week_body(&self, today: NaiveDate) -> Option<String> {
        let (start, end) = week_bounds(today);
        let url = calendar_url(start, end).ok()?;
        match self.fetcher.get_text(&url, self.timeout).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Yahoo calendar {}..{} failed: {}", start, end, e);
                None
            }
        }
    }

    pub async fn earnings(&self, today: NaiveDate) -> Vec<Value> {
        self.week_body(today)
            .await
            .map(|body| parse_calendar_earnings(&body))
            .unwrap_or_default()
    }

    pub async fn economic_events(&self, today: NaiveDate) -> Vec<EconomicEvent> {
        self.week_body(today)
            .await
            .map(|body| parse_calendar_economic_events(&body))
            .unwrap_or_default()
    }
}
