use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: String },

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MarketError {
    /// True for 429s and for upstream bodies that report throttling in text.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            MarketError::RateLimited { .. } => true,
            MarketError::Http { status, .. } => *status == 429,
            other => other.to_string().to_lowercase().contains("rate limit"),
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
