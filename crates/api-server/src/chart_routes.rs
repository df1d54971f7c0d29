use axum::{
    extract::{Query, State},
    http::Uri,
    response::Response,
    routing::get,
    Router,
};
use market_orchestrator::{DEFAULT_INTERVAL, DEFAULT_RANGE};
use serde::Deserialize;

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const CHART_TTL_SECS: i64 = 600;
const DEFAULT_SYMBOL: &str = "SPY";

#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub symbol: Option<String>,
    pub range: Option<String>,
    pub interval: Option<String>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn chart_routes() -> Router<AppState> {
    Router::new().route("/api/chart", get(get_chart))
}

async fn get_chart(State(state): State<AppState>, uri: Uri, Query(params): Query<ChartParams>) -> Response {
    let symbol = or_default(params.symbol, DEFAULT_SYMBOL).to_uppercase();
    let range = or_default(params.range, DEFAULT_RANGE);
    let interval = or_default(params.interval, DEFAULT_INTERVAL);

    state
        .edge_cache
        .serve(&cache_key(&uri), CHART_TTL_SECS, || async {
            let reply = state.charts.chart(&symbol, &range, &interval).await;
            tracing::debug!("Chart {} {} {} from {}", symbol, range, interval, reply.source);
            Rendered::raw_json(reply.body, reply.available)
        })
        .await
}
