use market_core::Candle;

/// Exponential Moving Average, seeded with the first value.
///
/// `ema[0] = data[0]`, then `ema[n] = data[n] * k + ema[n-1] * (1 - k)` with
/// `k = 2 / (period + 1)`. The output has the same length as the input, so a
/// series shorter than `period` still yields values.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    let mut prev = data[0];
    result.push(prev);

    for value in &data[1..] {
        prev = value * k + prev * (1.0 - k);
        result.push(prev);
    }

    result
}

/// Last value of [`ema`], if any.
pub fn last_ema(data: &[f64], period: usize) -> Option<f64> {
    ema(data, period).last().copied()
}

/// Highest and lowest close over the whole series.
pub fn close_range(candles: &[Candle]) -> Option<(f64, f64)> {
    candles
        .iter()
        .map(|c| c.c)
        .filter(|c| c.is_finite())
        .fold(None, |acc, close| match acc {
            None => Some((close, close)),
            Some((hi, lo)) => Some((hi.max(close), lo.min(close))),
        })
}

/// Percent change from `prev` to `last`; zero when `prev` is zero.
pub fn percent_change(prev: f64, last: f64) -> f64 {
    if prev == 0.0 {
        0.0
    } else {
        (last - prev) / prev * 100.0
    }
}
