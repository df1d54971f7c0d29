//! Plain-text article extraction.

use market_clients::is_public_web_url;
use market_core::TextFetcher;
use news_feeds::strip_html;
use std::sync::Arc;
use std::time::Duration;

pub const READER_TIMEOUT: Duration = Duration::from_secs(5);
const JINA_READER: &str = "https://r.jina.ai/http://";

pub fn reader_url(target: &str) -> String {
    let bare = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target);
    format!("{}{}", JINA_READER, bare)
}

pub struct ArticleReader {
    fetcher: Arc<dyn TextFetcher>,
    timeout: Duration,
}

impl ArticleReader {
    pub fn new(fetcher: Arc<dyn TextFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Reader-service text, else the page itself with markup stripped. Empty
    /// when both fail or the target is not a public http(s) URL.
    pub async fn read(&self, target: &str) -> String {
        let target = target.trim();
        if target.is_empty() {
            return String::new();
        }
        if !is_public_web_url(target) {
            tracing::warn!("Refusing to read non-public url {}", target);
            return String::new();
        }

        match self.fetcher.get_text(&reader_url(target), READER_TIMEOUT).await {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => tracing::debug!("Reader returned nothing for {}", target),
            Err(e) => tracing::debug!("Reader failed for {}: {}", target, e),
        }

        match self.fetcher.get_text(target, self.timeout).await {
            Ok(html) => strip_html(&html),
            Err(e) => {
                tracing::warn!("Direct fetch of {} failed: {}", target, e);
                String::new()
            }
        }
    }
}
