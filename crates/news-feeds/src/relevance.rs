use regex::Regex;
use std::sync::LazyLock;

macro_rules! re {
    ($pat:expr) => {
        LazyLock::new(|| Regex::new($pat).unwrap())
    };
}

static RE_FINANCE: LazyLock<Regex> = re!(
    r"(?i)(stock|stocks|share|shares|market|wall street|fed|rates|yields|earnings|guidance|upgrade|downgrade|price target|pre[- ]?market|after[- ]?hours|nasdaq|s&p|dow|ipo|dividend|buyback|sec|treasury|bond)"
);
static RE_TICKER_LIKE: LazyLock<Regex> = re!(r"\b[A-Z]{1,5}\b");

static RE_FOREIGN_MARKET: LazyLock<Regex> = re!(
    r"(?i)\b(ftse|nikkei|hang seng|sensex|nifty|dax|cac 40|euro stoxx|asx|tsx|shanghai composite|kospi)\b"
);
static RE_US_MARKER: LazyLock<Regex> = re!(r"(?i)(wall street|nasdaq|s&p|\bdow\b|\bnyse\b|\bu\.s\.|\bus stocks\b)");

/// Finance vocabulary anywhere in the title, or a ticker-shaped capitalized word.
pub fn is_market_relevant(title: &str) -> bool {
    RE_FINANCE.is_match(title) || RE_TICKER_LIKE.is_match(title)
}

/// A title about a foreign market with no US anchor.
pub fn is_international_only(title: &str) -> bool {
    RE_FOREIGN_MARKET.is_match(title) && !RE_US_MARKER.is_match(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finance_words_or_tickers_pass() {
        assert!(is_market_relevant("Stocks slip as yields climb"));
        assert!(is_market_relevant("NVDA hits a record"));
        assert!(!is_market_relevant("local bakery wins a prize"));
    }

    #[test]
    fn foreign_markets_need_a_us_marker() {
        assert!(is_international_only("FTSE 100 closes higher on miners"));
        assert!(is_international_only("Nikkei slides as yen firms"));
        assert!(!is_international_only("Nikkei and Nasdaq both rally"));
        assert!(!is_international_only("Wall Street opens flat"));
    }
}
