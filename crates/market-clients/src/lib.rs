//! Upstream adapters. Each one owns its private response types and maps them
//! into the shared `market-core` shapes, treating missing fields as absent.

pub mod alpha_vantage;
pub mod finnhub;
pub mod http;
pub mod iex;
pub mod nasdaq;
pub mod openai;
mod per_symbol;
pub mod polygon;
pub mod registry;
pub mod yahoo;

#[cfg(test)]
mod test_support;

pub use alpha_vantage::AlphaVantageQuoteProvider;
pub use finnhub::FinnhubQuoteProvider;
pub use http::{build_url, is_public_web_url, HttpFetcher, BROWSER_USER_AGENT};
pub use iex::IexQuoteProvider;
pub use openai::{ChatCompletion, ChatRequest, OpenAiClient, OpenAiError};
pub use polygon::PolygonQuoteProvider;
pub use registry::{build_quote_providers, ProviderKeys, DEFAULT_PROVIDER_ORDER, KNOWN_PROVIDERS};
pub use yahoo::{YahooHost, YahooQuoteProvider};
