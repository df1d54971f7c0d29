use axum::{
    extract::{Query, State},
    http::Uri,
    response::Response,
    routing::get,
    Router,
};
use market_orchestrator::trending::{DEFAULT_PER_SOURCE, DEFAULT_TRENDING_COUNT};
use market_orchestrator::TrendingSource;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const TRENDING_TTL_SECS: i64 = 300;
pub const TRENDING_SOURCES_TTL_SECS: i64 = 120;
const DEFAULT_REGION: &str = "US";

#[derive(Debug, Default, Deserialize)]
pub struct TrendingParams {
    pub region: Option<String>,
    pub count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SourcesParams {
    pub region: Option<String>,
    pub per: Option<String>,
    pub name: Option<String>,
}

fn region_of(raw: Option<String>) -> String {
    raw.map(|r| r.trim().to_uppercase())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

pub fn trending_routes() -> Router<AppState> {
    Router::new()
        .route("/api/trending", get(get_trending))
        .route("/api/trending-sources", get(get_trending_sources))
}

async fn get_trending(State(state): State<AppState>, uri: Uri, Query(params): Query<TrendingParams>) -> Response {
    let region = region_of(params.region);
    let count = params
        .count
        .and_then(|c| c.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_TRENDING_COUNT);

    state
        .edge_cache
        .serve(&cache_key(&uri), TRENDING_TTL_SECS, || async {
            let symbols = state.trending.trending(&region, count).await;
            let cacheable = !symbols.is_empty();
            Rendered::json(&json!({ "symbols": symbols }), cacheable)
        })
        .await
}

async fn get_trending_sources(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<SourcesParams>,
) -> Response {
    let region = region_of(params.region);
    let per = params
        .per
        .and_then(|p| p.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_PER_SOURCE);
    let source = params.name.as_deref().and_then(TrendingSource::from_name);

    state
        .edge_cache
        .serve(&cache_key(&uri), TRENDING_SOURCES_TTL_SECS, || async {
            match source {
                Some(source) => {
                    let symbols = state.trending.from_source(source, &region, per).await;
                    let cacheable = !symbols.is_empty();
                    let mut body = Map::new();
                    body.insert(source.key().to_string(), json!(symbols));
                    Rendered::json(&Value::Object(body), cacheable)
                }
                None => {
                    let snapshot = state.trending.all_sources(&region, per).await;
                    let cacheable = !snapshot.yahoo.is_empty() || !snapshot.stocktwits.is_empty();
                    Rendered::json(&snapshot, cacheable)
                }
            }
        })
        .await
}
