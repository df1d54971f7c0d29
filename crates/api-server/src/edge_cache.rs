//! Response cache in front of the upstream-backed handlers.
//!
//! Entries are keyed by path and query string and hold the rendered body, so a
//! hit is replayed byte-for-byte without touching any upstream.

use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::Duration;
use market_orchestrator::TtlCache;
use serde::Serialize;
use std::future::Future;

pub const JSON: &str = "application/json";
pub const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq)]
pub struct CachedBody {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

/// A freshly produced response and whether it is good enough to store.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub body: CachedBody,
    pub cacheable: bool,
}

impl Rendered {
    pub fn json<T: Serialize>(value: &T, cacheable: bool) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::raw_json(body, cacheable),
            Err(e) => {
                tracing::error!("Failed to serialize response: {}", e);
                Self::raw_json(r#"{"error":"serialization_failed"}"#.to_string(), false)
            }
        }
    }

    /// An already-serialized JSON body, such as an upstream pass-through.
    pub fn raw_json(body: String, cacheable: bool) -> Self {
        Self {
            body: CachedBody {
                status: 200,
                content_type: JSON,
                body,
            },
            cacheable,
        }
    }

    pub fn text(body: String, cacheable: bool) -> Self {
        Self {
            body: CachedBody {
                status: 200,
                content_type: PLAIN_TEXT,
                body,
            },
            cacheable,
        }
    }
}

pub struct EdgeCache {
    entries: TtlCache<CachedBody>,
}

impl EdgeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: TtlCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replay a live entry for `key`, or run `produce` and store its result
    /// when it is cacheable and successful.
    pub async fn serve<F, Fut>(&self, key: &str, ttl_secs: i64, produce: F) -> Response
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Rendered>,
    {
        if let Some(hit) = self.entries.get(key, Duration::seconds(ttl_secs)) {
            tracing::debug!("Cache hit for {}", key);
            return respond(hit, Some(ttl_secs), "HIT");
        }

        tracing::debug!("Cache miss for {}", key);
        let rendered = produce().await;
        let store = rendered.cacheable && (200..300).contains(&rendered.body.status);
        if store {
            self.entries.insert(key, rendered.body.clone());
            respond(rendered.body, Some(ttl_secs), "MISS")
        } else {
            respond(rendered.body, None, "MISS")
        }
    }
}

/// Path plus query string, exactly as requested.
pub fn cache_key(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn respond(entry: CachedBody, ttl_secs: Option<i64>, cache_state: &'static str) -> Response {
    let status = StatusCode::from_u16(entry.status).unwrap_or(StatusCode::OK);
    let cache_control = match ttl_secs {
        Some(ttl) => format!("public, s-maxage={}", ttl),
        None => "no-store".to_string(),
    };

    let mut response = (status, entry.body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(entry.content_type));
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    headers.insert("x-cache", HeaderValue::from_static(cache_state));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn second_request_is_a_hit() {
        let cache = EdgeCache::new(8);
        let calls = AtomicUsize::new(0);
        let produce = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Rendered::json(&serde_json::json!({"n": 1}), true)
        };

        let first = cache.serve("/api/x?a=1", 60, produce).await;
        assert_eq!(first.headers()["x-cache"], "MISS");
        assert_eq!(first.headers()["cache-control"], "public, s-maxage=60");

        let second = cache
            .serve("/api/x?a=1", 60, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Rendered::json(&serde_json::json!({"n": 2}), true)
            })
            .await;
        assert_eq!(second.headers()["x-cache"], "HIT");
        assert_eq!(second.headers()["content-type"], "application/json");
        assert_eq!(body_of(second).await, r#"{"n":1}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn uncacheable_results_are_not_stored() {
        let cache = EdgeCache::new(8);
        let response = cache
            .serve("/api/read?url=x", 600, || async { Rendered::text(String::new(), false) })
            .await;
        assert_eq!(response.headers()["cache-control"], "no-store");
        assert_eq!(response.headers()["content-type"], PLAIN_TEXT);
        assert!(cache.is_empty());
    }

    #[test]
    fn key_keeps_the_query() {
        let uri: Uri = "/api/quote?symbols=AAPL,MSFT".parse().unwrap();
        assert_eq!(cache_key(&uri), "/api/quote?symbols=AAPL,MSFT");
        let bare: Uri = "/api/ipos".parse().unwrap();
        assert_eq!(cache_key(&bare), "/api/ipos");
    }
}
