//! StockTwits stream and trending payloads.

use crate::text::truncate_chars;
use market_core::NewsItem;
use serde::Deserialize;

pub const TRENDING_URL: &str = "https://api.stocktwits.com/api/2/trending/symbols.json";
pub const SOURCE_NAME: &str = "StockTwits";

const TITLE_CHARS: usize = 140;

pub fn stream_url(symbol: &str) -> String {
    format!("https://api.stocktwits.com/api/2/streams/symbol/{}.json", symbol)
}

#[derive(Debug, Deserialize, Default)]
struct StreamResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: Option<serde_json::Value>,
    body: Option<String>,
    created_at: Option<String>,
    user: Option<User>,
    entities: Option<Entities>,
}

#[derive(Debug, Deserialize)]
struct User {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Entities {
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TrendingResponse {
    #[serde(default)]
    symbols: Vec<TrendingSymbol>,
}

#[derive(Debug, Deserialize)]
struct TrendingSymbol {
    symbol: Option<String>,
}

/// Map a symbol stream into news items. Unparsable bodies yield nothing.
pub fn parse_stream(body: &str) -> Vec<NewsItem> {
    let response: StreamResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("StockTwits stream body not understood: {}", e);
            return Vec::new();
        }
    };

    response
        .messages
        .into_iter()
        .filter_map(|message| {
            let id = match message.id? {
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) => s,
                _ => return None,
            };

            let title = message
                .body
                .as_deref()
                .map(|b| truncate_chars(b.trim(), TITLE_CHARS))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Post".to_string());

            let linked = message
                .entities
                .and_then(|e| e.links.into_iter().find_map(|l| l.url))
                .filter(|u| !u.is_empty());
            let username = message.user.and_then(|u| u.username).unwrap_or_default();
            let url = linked.unwrap_or_else(|| format!("https://stocktwits.com/{}/message/{}", username, id));

            Some(NewsItem {
                id: format!("st_{}", id),
                title,
                url,
                source: SOURCE_NAME.to_string(),
                published_at: message.created_at,
                description: None,
            })
        })
        .collect()
}

/// Trending symbols in ranking order, deduped.
pub fn parse_trending_symbols(body: &str) -> Vec<String> {
    let response: TrendingResponse = serde_json::from_str(body).unwrap_or_default();
    let mut out: Vec<String> = Vec::new();
    for symbol in response.symbols.into_iter().filter_map(|s| s.symbol) {
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}
