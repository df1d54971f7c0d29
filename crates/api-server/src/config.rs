use market_clients::openai::DEFAULT_BASE_URL;
use market_clients::{ProviderKeys, DEFAULT_PROVIDER_ORDER};
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SYMBOL_CAP: usize = 20;
const DEFAULT_FEED_TIMEOUT_MS: u64 = 7000;
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub provider_keys: ProviderKeys,
    pub quote_providers: Vec<String>,
    pub quote_symbol_cap: usize,
    pub quote_technical_analysis: bool,
    pub news_feed_timeout: Duration,
    pub news_us_only: bool,
    pub upstream_timeout: Duration,
    pub cache_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            provider_keys: ProviderKeys::default(),
            quote_providers: DEFAULT_PROVIDER_ORDER.iter().map(|s| s.to_string()).collect(),
            quote_symbol_cap: DEFAULT_SYMBOL_CAP,
            quote_technical_analysis: true,
            news_feed_timeout: Duration::from_millis(DEFAULT_FEED_TIMEOUT_MS),
            news_us_only: true,
            upstream_timeout: Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset; numbers that do
    /// not parse fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let quote_providers = get("QUOTE_PROVIDERS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.quote_providers);

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            provider_keys: ProviderKeys {
                polygon: get("POLYGON_KEY"),
                finnhub: get("FINNHUB_KEY"),
                iex: get("IEX_KEY"),
                alpha_vantage: get("ALPHA_VANTAGE_KEY"),
            },
            quote_providers,
            quote_symbol_cap: parse_or("QUOTE_SYMBOL_CAP", get("QUOTE_SYMBOL_CAP"), DEFAULT_SYMBOL_CAP).clamp(10, 50),
            quote_technical_analysis: flag(get("QUOTE_TECHNICAL_ANALYSIS"), true),
            news_feed_timeout: Duration::from_millis(
                parse_or("NEWS_FEED_TIMEOUT_MS", get("NEWS_FEED_TIMEOUT_MS"), DEFAULT_FEED_TIMEOUT_MS)
                    .clamp(1000, 10_000),
            ),
            news_us_only: flag(get("NEWS_US_ONLY"), true),
            upstream_timeout: Duration::from_millis(parse_or(
                "UPSTREAM_TIMEOUT_MS",
                get("UPSTREAM_TIMEOUT_MS"),
                DEFAULT_UPSTREAM_TIMEOUT_MS,
            )),
            cache_capacity: parse_or("CACHE_CAPACITY", get("CACHE_CAPACITY"), DEFAULT_CACHE_CAPACITY),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}

fn flag(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::to_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
