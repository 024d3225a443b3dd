//! RSI (Relative Strength Index) oscillator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - Seed: simple mean of the first `period` gains/losses
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / max(avg_loss, 0.0001)))
//!
//! The seed window is consumed by seeding only and never emitted. For `n`
//! closes the series holds `n - 1 - period` values with `offset = period + 1`.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

/// Floor applied to the average loss before dividing.
pub const LOSS_EPSILON: f64 = 0.0001;

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut series = IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        offset: period + 1,
        values: Vec::new(),
    };

    if period == 0 || closes.len() <= period + 1 {
        return series;
    }

    let mut gains: Vec<f64> = Vec::with_capacity(closes.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(closes.len() - 1);

    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let p = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / p;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / p;

    series.values.reserve(gains.len() - period);
    for (gain, loss) in gains.iter().zip(&losses).skip(period) {
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        series.values.push(oscillator(avg_gain, avg_loss));
    }

    series
}

fn oscillator(avg_gain: f64, avg_loss: f64) -> f64 {
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss.max(LOSS_EPSILON))
}
