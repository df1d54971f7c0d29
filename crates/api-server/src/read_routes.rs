use axum::{
    extract::{Query, State},
    http::Uri,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::edge_cache::{cache_key, Rendered};
use crate::AppState;

pub const READ_TTL_SECS: i64 = 600;

#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    pub url: Option<String>,
}

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/api/read", get(get_article))
}

/// Plain text of an article. Always 200; an empty body means nothing could be read.
async fn get_article(State(state): State<AppState>, uri: Uri, Query(params): Query<ReadParams>) -> Response {
    let target = params.url.unwrap_or_default();

    state
        .edge_cache
        .serve(&cache_key(&uri), READ_TTL_SECS, || async {
            let text = state.reader.read(&target).await;
            let cacheable = !text.is_empty();
            Rendered::text(text, cacheable)
        })
        .await
}
