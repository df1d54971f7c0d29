use crate::{MarketResult, Quote};
use async_trait::async_trait;
use std::time::Duration;

/// A quote upstream that takes part in the fallback chain.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Stable identifier used in `source`, status blocks and configuration.
    fn name(&self) -> &str;

    /// Human-readable label for status messages.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Providers that need an API key report `false` when it is absent.
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> MarketResult<Vec<Quote>>;
}

/// Plain GET of a text body. Non-success statuses are errors.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn get_text(&self, url: &str, timeout: Duration) -> MarketResult<String>;
}
