use chrono::{DateTime, Duration, Utc};
use market_core::{Prediction, Quote, TechnicalLevels, Trend};

const SUPPORT_RATIO: f64 = 0.95;
const RESISTANCE_RATIO: f64 = 1.05;
const ENTRY_RATIO: f64 = 0.98;
const EXIT_RATIO: f64 = 1.08;
const STOP_LOSS_RATIO: f64 = 0.92;
const RISK_REWARD: f64 = 3.0;
const REFRESH_MINUTES: i64 = 5;

/// Fixed-ratio reference levels around the current price.
pub fn placeholder_levels(price: f64, change_percent: f64, now: DateTime<Utc>) -> TechnicalLevels {
    let (trend, prediction) = if change_percent > 0.0 {
        (Trend::Up, Prediction::Bullish)
    } else if change_percent < 0.0 {
        (Trend::Down, Prediction::Bearish)
    } else {
        (Trend::Sideways, Prediction::Neutral)
    };

    TechnicalLevels {
        support_level: price * SUPPORT_RATIO,
        resistance_level: price * RESISTANCE_RATIO,
        trend,
        prediction,
        entry_price: price * ENTRY_RATIO,
        exit_price: price * EXIT_RATIO,
        stop_loss: price * STOP_LOSS_RATIO,
        risk_reward_ratio: RISK_REWARD,
        confidence: (0.5 + change_percent.abs() / 20.0).min(0.9),
        next_update: now + Duration::minutes(REFRESH_MINUTES),
    }
}

/// Attach levels to every priced, error-free quote.
pub fn attach_levels(quotes: &mut [Quote], now: DateTime<Utc>) {
    for quote in quotes.iter_mut().filter(|q| !q.is_error() && q.price > 0.0) {
        quote.technical_analysis = Some(placeholder_levels(quote.price, quote.change_percent, now));
    }
}
