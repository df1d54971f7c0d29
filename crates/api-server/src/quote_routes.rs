use axum::{
    extract::{Query, State},
    http::Uri,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_orchestrator::parse_symbols;
use serde::Deserialize;

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const QUOTE_TTL_SECS: i64 = 300;

#[derive(Debug, Default, Deserialize)]
pub struct QuoteParams {
    pub symbols: Option<String>,
}

pub fn quote_routes() -> Router<AppState> {
    Router::new().route("/api/quote", get(get_quotes))
}

async fn get_quotes(State(state): State<AppState>, uri: Uri, Query(params): Query<QuoteParams>) -> Response {
    let csv = params.symbols.unwrap_or_default();
    if parse_symbols(&csv, state.quotes.symbol_cap()).is_empty() {
        return Json(serde_json::json!({ "quoteResponse": { "result": [] } })).into_response();
    }

    state
        .edge_cache
        .serve(&cache_key(&uri), QUOTE_TTL_SECS, || async {
            let response = state.quotes.fetch_csv(&csv).await;
            tracing::info!(
                "Quotes: {} ({})",
                response.status.message,
                response.source.as_deref().unwrap_or("no source")
            );
            let cacheable = !response.is_empty();
            Rendered::json(&response, cacheable)
        })
        .await
}
