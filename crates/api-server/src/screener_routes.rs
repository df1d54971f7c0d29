use axum::{
    extract::{Query, State},
    http::Uri,
    response::Response,
    routing::get,
    Router,
};
use market_clients::yahoo::screener_saved_url;
use market_orchestrator::{ScreenCategory, Universe};
use serde::Deserialize;
use serde_json::Value;

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const SCREENER_SAVED_TTL_SECS: i64 = 300;
pub const SCREENER_TTL_SECS: i64 = 600;
const DEFAULT_SCR_IDS: &str = "most_actives";
const DEFAULT_SAVED_COUNT: u32 = 50;
const MAX_SAVED_COUNT: u32 = 250;
const EMPTY_SAVED: &str = r#"{"quotes":[]}"#;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedParams {
    pub scr_ids: Option<String>,
    pub count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScreenParams {
    pub symbols: Option<String>,
    pub category: Option<String>,
    pub universe: Option<String>,
}

impl ScreenParams {
    /// Explicit symbols win, then a category, then a named universe. With
    /// none of them the most-active screen is used.
    fn universe(&self) -> Universe {
        let symbols: Vec<String> = self
            .symbols
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !symbols.is_empty() {
            return Universe::Symbols(symbols);
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.trim().is_empty()) {
            return Universe::Category(ScreenCategory::from_name(category));
        }
        self.universe
            .as_deref()
            .and_then(Universe::from_name)
            .unwrap_or(Universe::Category(ScreenCategory::MostActive))
    }
}

pub fn screener_routes() -> Router<AppState> {
    Router::new()
        .route("/api/screener-saved", get(get_screener_saved))
        .route("/api/screener", get(get_screener))
}

async fn get_screener_saved(State(state): State<AppState>, uri: Uri, Query(params): Query<SavedParams>) -> Response {
    let scr_ids = params
        .scr_ids
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SCR_IDS.to_string());
    let count = params
        .count
        .and_then(|c| c.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_SAVED_COUNT)
        .clamp(1, MAX_SAVED_COUNT);

    state
        .edge_cache
        .serve(&cache_key(&uri), SCREENER_SAVED_TTL_SECS, || async {
            let url = match screener_saved_url(&scr_ids, count) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Bad screener id {:?}: {}", scr_ids, e);
                    return Rendered::raw_json(EMPTY_SAVED.to_string(), false);
                }
            };
            match state.fetcher.get_text(&url, state.config.upstream_timeout).await {
                Ok(body) if serde_json::from_str::<Value>(&body).is_ok() => Rendered::raw_json(body, true),
                Ok(_) => {
                    tracing::warn!("Yahoo screener {} returned a non-JSON body", scr_ids);
                    Rendered::raw_json(EMPTY_SAVED.to_string(), false)
                }
                Err(e) => {
                    tracing::warn!("Yahoo screener {} failed: {}", scr_ids, e);
                    Rendered::raw_json(EMPTY_SAVED.to_string(), false)
                }
            }
        })
        .await
}

async fn get_screener(State(state): State<AppState>, uri: Uri, Query(params): Query<ScreenParams>) -> Response {
    let universe = params.universe();

    state
        .edge_cache
        .serve(&cache_key(&uri), SCREENER_TTL_SECS, || async {
            let outcome = state.screener.run(&universe).await;
            tracing::info!(
                "Screened {} of {} symbols{}",
                outcome.results.len(),
                outcome.universe,
                if outcome.degraded { " (degraded)" } else { "" }
            );
            let cacheable = !outcome.results.is_empty() && !outcome.degraded;
            Rendered::json(&outcome, cacheable)
        })
        .await
}
