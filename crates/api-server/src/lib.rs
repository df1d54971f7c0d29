//! HTTP surface of the market dashboard backend.

pub mod ai_routes;
pub mod calendar_routes;
pub mod chart_routes;
pub mod config;
pub mod edge_cache;
pub mod market_routes;
pub mod news_routes;
pub mod quote_routes;
pub mod read_routes;
pub mod request_id;
pub mod screener_routes;
pub mod security_headers;
pub mod trending_routes;


use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_clients::{build_quote_providers, HttpFetcher, OpenAiClient, OpenAiError};
use market_core::{QuoteProvider, TextFetcher};
use market_orchestrator::{
    ArticleReader, CalendarService, ChartService, ContextSearchService, NewsAggregator, QuoteAggregator, Screener,
    TrendingService,
};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use edge_cache::EdgeCache;

/// Shared handler state. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub fetcher: Arc<dyn TextFetcher>,
    pub quotes: Arc<QuoteAggregator>,
    pub news: Arc<NewsAggregator>,
    pub charts: Arc<ChartService>,
    pub trending: Arc<TrendingService>,
    pub screener: Arc<Screener>,
    pub context: Arc<ContextSearchService>,
    pub reader: Arc<ArticleReader>,
    pub calendar: Arc<CalendarService>,
    pub openai: Arc<OpenAiClient>,
    pub edge_cache: Arc<EdgeCache>,
}

impl AppState {
    /// Production wiring: one reqwest fetcher shared by every upstream adapter.
    pub fn from_config(config: AppConfig) -> Self {
        let fetcher: Arc<dyn TextFetcher> = Arc::new(HttpFetcher::new(config.upstream_timeout));
        let providers = build_quote_providers(
            &config.quote_providers,
            &config.provider_keys,
            fetcher.clone(),
            config.upstream_timeout,
        );
        Self::from_parts(config, fetcher, providers)
    }

    /// Wire the pipelines around an explicit fetcher and provider chain.
    pub fn from_parts(config: AppConfig, fetcher: Arc<dyn TextFetcher>, providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        let timeout = config.upstream_timeout;

        let quotes = Arc::new(QuoteAggregator::new(
            providers,
            config.quote_symbol_cap,
            config.quote_technical_analysis,
        ));
        let charts = Arc::new(ChartService::new(
            fetcher.clone(),
            config.provider_keys.alpha_vantage.clone(),
            timeout,
        ));
        let trending = Arc::new(TrendingService::new(fetcher.clone(), market_orchestrator::trending::SOURCE_TIMEOUT));
        let screener = Arc::new(Screener::new(
            quotes.clone(),
            charts.clone(),
            trending.clone(),
            fetcher.clone(),
            timeout,
        ));

        Self {
            news: Arc::new(NewsAggregator::new(
                fetcher.clone(),
                config.news_feed_timeout,
                config.news_us_only,
            )),
            context: Arc::new(ContextSearchService::new(fetcher.clone(), config.news_feed_timeout)),
            reader: Arc::new(ArticleReader::new(fetcher.clone(), timeout)),
            calendar: Arc::new(CalendarService::new(fetcher.clone(), timeout)),
            openai: Arc::new(OpenAiClient::new(
                config.openai_api_key.clone(),
                config.openai_base_url.clone(),
                timeout,
            )),
            edge_cache: Arc::new(EdgeCache::new(config.cache_capacity)),
            quotes,
            charts,
            trending,
            screener,
            fetcher,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Config(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "proxy_error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<OpenAiError> for AppError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::MissingApiKey => AppError::Config("Missing OPENAI_API_KEY".to_string()),
            OpenAiError::InvalidRequest(msg) => AppError::BadRequest(msg),
            OpenAiError::RequestFailed(e) => AppError::Upstream(e.to_string()),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(quote_routes::quote_routes())
        .merge(news_routes::news_routes())
        .merge(chart_routes::chart_routes())
        .merge(trending_routes::trending_routes())
        .merge(screener_routes::screener_routes())
        .merge(ai_routes::ai_routes())
        .merge(read_routes::read_routes())
        .merge(market_routes::market_routes())
        .merge(calendar_routes::calendar_routes())
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let addr = config.bind_addr();

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; /api/ai will answer 500");
    }

    let state = AppState::from_config(config);
    tracing::info!(
        "Quote providers: {} (symbol cap {})",
        state.quotes.provider_names().join(", "),
        state.quotes.symbol_cap()
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
