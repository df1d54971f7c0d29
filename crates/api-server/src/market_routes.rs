use axum::{extract::State, http::Uri, response::Response, routing::get, Router};
use market_clients::nasdaq::fetch_ipo_calendar;
use market_orchestrator::market_snapshot;

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const MARKET_DATA_TTL_SECS: i64 = 60;
pub const IPOS_TTL_SECS: i64 = 3600;
const IPOS_UNAVAILABLE: &str = r#"{"error":"unavailable"}"#;

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/api/market-data", get(get_market_data))
        .route("/api/ipos", get(get_ipos))
}

async fn get_market_data(State(state): State<AppState>, uri: Uri) -> Response {
    state
        .edge_cache
        .serve(&cache_key(&uri), MARKET_DATA_TTL_SECS, || async {
            let snapshot = market_snapshot(&state.quotes).await;
            let cacheable = snapshot.error.is_none();
            Rendered::json(&snapshot, cacheable)
        })
        .await
}

async fn get_ipos(State(state): State<AppState>, uri: Uri) -> Response {
    state
        .edge_cache
        .serve(&cache_key(&uri), IPOS_TTL_SECS, || async {
            match fetch_ipo_calendar(state.fetcher.as_ref(), state.config.upstream_timeout).await {
                Some(body) => Rendered::raw_json(body, true),
                None => Rendered::raw_json(IPOS_UNAVAILABLE.to_string(), false),
            }
        })
        .await
}
