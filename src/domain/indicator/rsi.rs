//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain/loss are simple trailing means of the last n price changes:
//! - gain = max(delta, 0), loss = max(-delta, 0)
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! - If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes).

use crate::domain::error::TradelensError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::TimeSeries;

pub const DEFAULT_PERIOD: usize = 14;

/// A period at or beyond the series length yields an all-undefined result.
pub fn relative_strength_index(
    values: &[f64],
    period: usize,
) -> Result<Vec<Option<f64>>, TradelensError> {
    if values.is_empty() {
        return Err(TradelensError::InsufficientData {
            have: 0,
            need: period + 1,
        });
    }
    if period == 0 {
        return Err(TradelensError::invalid("period must be positive"));
    }

    let mut gains = vec![0.0; values.len()];
    let mut losses = vec![0.0; values.len()];
    for i in 1..values.len() {
        let delta = values[i] - values[i - 1];
        gains[i] = delta.max(0.0);
        losses[i] = (-delta).max(0.0);
    }

    let out = (0..values.len())
        .map(|i| {
            if i < period {
                return None;
            }
            let avg_gain = gains[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
            let avg_loss = losses[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
            Some(rsi_from_averages(avg_gain, avg_loss))
        })
        .collect();
    Ok(out)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(series: &TimeSeries, period: usize) -> Result<IndicatorSeries, TradelensError> {
    let values = relative_strength_index(&series.closes(), period)?;
    Ok(IndicatorSeries::from_values(
        IndicatorType::Rsi(period),
        series,
        values,
    ))
}
