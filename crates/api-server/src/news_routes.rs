use axum::{
    extract::{Query, State},
    http::Uri,
    response::Response,
    routing::get,
    Router,
};
use news_feeds::NewsQuery;
use serde::Deserialize;

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const NEWS_TTL_SECS: i64 = 60;

/// Raw query values; numbers are parsed leniently by `NewsQuery`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub q: Option<String>,
    pub source: Option<String>,
    pub per_source: Option<String>,
}

pub fn news_routes() -> Router<AppState> {
    Router::new().route("/api/news", get(get_news))
}

async fn get_news(State(state): State<AppState>, uri: Uri, Query(params): Query<NewsParams>) -> Response {
    let query = NewsQuery::from_params(
        params.page.as_deref(),
        params.page_size.as_deref(),
        params.q.as_deref(),
        params.source.as_deref(),
        params.per_source.as_deref(),
    );
    let raw_q = params.q.unwrap_or_default();

    state
        .edge_cache
        .serve(&cache_key(&uri), NEWS_TTL_SECS, || async {
            let page = state.news.page(&raw_q, &query).await;
            let cacheable = page.total > 0;
            Rendered::json(&page, cacheable)
        })
        .await
}
