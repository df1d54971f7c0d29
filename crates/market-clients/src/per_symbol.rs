use market_core::{MarketError, MarketResult, Quote};
use std::future::Future;

/// Drive a one-symbol-per-request upstream over a symbol list.
///
/// Individual failures are logged and skipped. A throttle stops the loop: with
/// nothing collected yet the whole attempt reports `RateLimited`, otherwise the
/// partial set is returned.
pub(crate) async fn fetch_each<'a, F, Fut>(
    provider: &str,
    symbols: &'a [String],
    mut fetch_one: F,
) -> MarketResult<Vec<Quote>>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = MarketResult<Option<Quote>>>,
{
    let mut quotes = Vec::new();

    for symbol in symbols {
        match fetch_one(symbol.as_str()).await {
            Ok(Some(quote)) => quotes.push(quote),
            Ok(None) => tracing::debug!("{} has no data for {}", provider, symbol),
            Err(e) if e.is_rate_limited() => {
                if quotes.is_empty() {
                    return Err(MarketError::RateLimited {
                        provider: provider.to_string(),
                    });
                }
                tracing::warn!(
                    "{} rate limited after {} of {} symbols",
                    provider,
                    quotes.len(),
                    symbols.len()
                );
                break;
            }
            Err(e) => tracing::warn!("{} quote for {} failed: {}", provider, symbol, e),
        }
    }

    Ok(quotes)
}

/// Parse a numeric string such as `"189.2500"` or `"-0.53%"`.
pub(crate) fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(|s| s.trim().trim_end_matches('%'))
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
