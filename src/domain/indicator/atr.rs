//! Average True Range indicator.
//!
//! TR[0] = high - low (no previous close)
//! TR[i] = max(high - low, |high - prev_close|, |low - prev_close|)
//! ATR(n) = SMA(n) of TR, so the first (n-1) bars are undefined.

use crate::domain::error::{ensure_same_len, TradelensError};
use crate::domain::indicator::{moving_average, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::TimeSeries;

pub const DEFAULT_PERIOD: usize = 14;

pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, TradelensError> {
    ensure_same_len(high.len(), low.len())?;
    ensure_same_len(high.len(), close.len())?;
    if high.is_empty() {
        return Err(TradelensError::InsufficientData { have: 0, need: 1 });
    }

    let tr = (0..high.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                return hl;
            }
            let hc = (high[i] - close[i - 1]).abs();
            let lc = (low[i] - close[i - 1]).abs();
            hl.max(hc).max(lc)
        })
        .collect();
    Ok(tr)
}

pub fn average_true_range(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Result<Vec<Option<f64>>, TradelensError> {
    let tr = true_range(high, low, close)?;
    moving_average(&tr, period)
}

pub fn calculate_atr(series: &TimeSeries, period: usize) -> Result<IndicatorSeries, TradelensError> {
    let values = average_true_range(&series.highs(), &series.lows(), &series.closes(), period)?;
    Ok(IndicatorSeries::from_values(
        IndicatorType::Atr(period),
        series,
        values,
    ))
}
