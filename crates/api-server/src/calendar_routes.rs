use axum::{extract::State, http::Uri, response::Response, routing::get, Router};
use chrono::Utc;
use serde_json::json;

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const CALENDAR_TTL_SECS: i64 = 1800;

pub fn calendar_routes() -> Router<AppState> {
    Router::new()
        .route("/api/earnings", get(get_earnings))
        .route("/api/economic-events", get(get_economic_events))
}

async fn get_earnings(State(state): State<AppState>, uri: Uri) -> Response {
    state
        .edge_cache
        .serve(&cache_key(&uri), CALENDAR_TTL_SECS, || async {
            let earnings = state.calendar.earnings(Utc::now().date_naive()).await;
            let cacheable = !earnings.is_empty();
            Rendered::json(&json!({ "earnings": earnings }), cacheable)
        })
        .await
}

async fn get_economic_events(State(state): State<AppState>, uri: Uri) -> Response {
    state
        .edge_cache
        .serve(&cache_key(&uri), CALENDAR_TTL_SECS, || async {
            let events = state.calendar.economic_events(Utc::now().date_naive()).await;
            let cacheable = !events.is_empty();
            Rendered::json(&json!({ "events": events }), cacheable)
        })
        .await
}
