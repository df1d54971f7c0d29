use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use market_clients::ChatRequest;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ContextParams {
    pub q: Option<String>,
}

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai", post(post_chat))
        .route("/api/ai/context", get(get_context))
}

/// Relay a chat-completions request with the server-side key.
///
/// The key is checked before the body so a misconfigured deployment answers
/// 500 regardless of input.
async fn post_chat(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    if !state.openai.is_configured() {
        return Err(AppError::Config("Missing OPENAI_API_KEY".to_string()));
    }

    let payload: Value =
        serde_json::from_slice(&body).map_err(|_| AppError::BadRequest("invalid JSON body".to_string()))?;
    let request = ChatRequest::from_payload(&payload)?;

    tracing::info!("Chat completion: model={} messages={}", request.model, request.messages.len());
    let completion = state.openai.chat_completions(&request).await?;
    let status = StatusCode::from_u16(completion.status).unwrap_or(StatusCode::BAD_GATEWAY);

    Ok((
        status,
        [(header::CONTENT_TYPE, "application/json"), (header::CACHE_CONTROL, "no-store")],
        completion.body,
    )
        .into_response())
}

async fn get_context(State(state): State<AppState>, Query(params): Query<ContextParams>) -> Json<Value> {
    let query = params.q.unwrap_or_default();
    let items = state.context.search(&query).await;
    Json(json!({ "items": items }))
}
