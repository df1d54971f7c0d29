use async_trait::async_trait;
use market_core::{MarketError, MarketResult, TextFetcher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Canned responses keyed by URL substring; first match wins.
pub struct CannedFetcher {
    routes: Vec<(String, MarketResult<String>)>,
    pub calls: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
}

impl CannedFetcher {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(mut self, needle: &str, body: &str) -> Self {
        self.routes.push((needle.to_string(), Ok(body.to_string())));
        self
    }

    pub fn err(mut self, needle: &str, err: MarketError) -> Self {
        self.routes.push((needle.to_string(), Err(err)));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextFetcher for CannedFetcher {
    async fn get_text(&self, url: &str, _timeout: Duration) -> MarketResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        self.routes
            .iter()
            .find(|(needle, _)| url.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| {
                Err(MarketError::Http {
                    status: 404,
                    url: url.to_string(),
                })
            })
    }
}
