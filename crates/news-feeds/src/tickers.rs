//! Ticker-shaped token extraction from headlines and free-text queries.

use regex::Regex;
use std::sync::LazyLock;

static RE_CAPS_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{1,5}\b").unwrap());

/// Capitalized words that look like tickers but are outlets, indices or jargon.
pub const TICKER_BLACKLIST: &[&str] = &[
    "CNBC", "USD", "DJIA", "NYSE", "NASDAQ", "AMEX", "ETF", "TECH", "NEWS", "CEO", "EPS", "FOMC", "AI", "IPO", "USA",
];

pub const MAX_QUERY_TOKENS: usize = 3;
pub const MAX_QUERY_TICKERS: usize = 5;

/// Company and institution names mapped to the symbol used for search.
const COMPANY_TICKERS: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("alphabet", "GOOGL"),
    ("google", "GOOGL"),
    ("amazon", "AMZN"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("facebook", "META"),
    ("netflix", "NFLX"),
    ("intel", "INTC"),
    ("coca-cola", "KO"),
    ("coca cola", "KO"),
    ("mcdonalds", "MCD"),
    ("disney", "DIS"),
    ("jpmorgan", "JPM"),
    ("jp morgan", "JPM"),
    ("bank of america", "BAC"),
    ("wells fargo", "WFC"),
    ("goldman sachs", "GS"),
    ("morgan stanley", "MS"),
    ("berkshire", "BRK.A"),
    ("johnson & johnson", "JNJ"),
    ("procter & gamble", "PG"),
    ("unitedhealth", "UNH"),
    ("home depot", "HD"),
    ("mastercard", "MA"),
    ("paypal", "PYPL"),
    ("salesforce", "CRM"),
    ("oracle", "ORCL"),
    ("cisco", "CSCO"),
    ("adobe", "ADBE"),
    ("nike", "NKE"),
    ("starbucks", "SBUX"),
    ("costco", "COST"),
    ("walmart", "WMT"),
    ("chevron", "CVX"),
    ("exxon", "XOM"),
    ("pfizer", "PFE"),
    ("moderna", "MRNA"),
    ("palantir", "PLTR"),
    ("snowflake", "SNOW"),
    ("crowdstrike", "CRWD"),
    ("shopify", "SHOP"),
    ("robinhood", "HOOD"),
    ("coinbase", "COIN"),
    ("spotify", "SPOT"),
    ("uber", "UBER"),
    ("airbnb", "ABNB"),
    ("doordash", "DASH"),
    ("pinterest", "PINS"),
    ("electronic arts", "EA"),
    ("take-two", "TTWO"),
];

fn is_blacklisted(word: &str) -> bool {
    TICKER_BLACKLIST.contains(&word)
}

fn push_unique(out: &mut Vec<String>, symbol: &str) {
    if !out.iter().any(|s| s == symbol) {
        out.push(symbol.to_string());
    }
}

/// All-caps 1-5 letter words in `text`, minus the blacklist, deduped in order.
pub fn extract_text_tickers(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for m in RE_CAPS_WORD.find_iter(text) {
        if !is_blacklisted(m.as_str()) {
            push_unique(&mut out, m.as_str());
        }
    }
    out
}

/// Ticker tokens a user typed on purpose: `$tsla` style cashtags, or words of
/// two or more letters already written in capitals. At most three.
pub fn query_ticker_tokens(query: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in query.split_whitespace() {
        let (cashtag, body) = match word.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, word),
        };
        let body = body.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        let shaped = (1..=5).contains(&body.len()) && body.chars().all(|c| c.is_ascii_alphabetic());
        if !shaped {
            continue;
        }
        let typed_caps = body.len() >= 2 && body.chars().all(|c| c.is_ascii_uppercase());
        if cashtag || typed_caps {
            let symbol = body.to_ascii_uppercase();
            if !is_blacklisted(&symbol) {
                push_unique(&mut out, &symbol);
            }
        }
        if out.len() == MAX_QUERY_TOKENS {
            break;
        }
    }
    out
}

/// Company names mentioned in the query first, then explicit ticker tokens.
pub fn extract_query_tickers(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut out = Vec::new();
    for (name, symbol) in COMPANY_TICKERS {
        if contains_word(&lowered, name) {
            push_unique(&mut out, symbol);
        }
    }
    for token in query_ticker_tokens(query) {
        push_unique(&mut out, &token);
    }
    out.truncate(MAX_QUERY_TICKERS);
    out
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
