use crate::indicators::{close_range, last_ema, percent_change};
use market_core::{Candle, MarketError, MarketResult, ScreenResult};

/// Fewest daily bars a symbol needs before it is screened.
pub const MIN_SCREEN_POINTS: usize = 60;

pub const FAST_EMA_PERIOD: usize = 50;
pub const SLOW_EMA_PERIOD: usize = 200;

/// Compute EMA position and 52-week range for one symbol's candles.
///
/// Candles must be date-ascending. The last close is compared against the last
/// EMA value; `above_200` falls back to EMA(50) when EMA(200) is not usable.
pub fn screen_candles(symbol: &str, candles: &[Candle]) -> MarketResult<ScreenResult> {
    if candles.len() < MIN_SCREEN_POINTS {
        return Err(MarketError::InsufficientData(format!(
            "{} has {} points, need {}",
            symbol,
            candles.len(),
            MIN_SCREEN_POINTS
        )));
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.c).collect();
    let last = closes[closes.len() - 1];
    let prev = closes[closes.len() - 2];

    let e50 = last_ema(&closes, FAST_EMA_PERIOD)
        .ok_or_else(|| MarketError::InsufficientData(symbol.to_string()))?;
    let e200 = last_ema(&closes, SLOW_EMA_PERIOD)
        .filter(|v| v.is_finite())
        .unwrap_or(e50);
    let (high, low) = close_range(candles).unwrap_or((last, last));

    Ok(ScreenResult {
        symbol: symbol.to_string(),
        close: last,
        prev_close: Some(prev),
        change_pct: Some(percent_change(prev, last)),
        high_52w: high,
        low_52w: low,
        above_50: last >= e50,
        above_200: last >= e200,
        source: None,
    })
}
