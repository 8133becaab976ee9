//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::error::TradelensError;
use crate::domain::indicator::{check_window, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::TimeSeries;

pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, TradelensError> {
    check_window("window", window, values.len())?;

    let out = (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let sum: f64 = values[i + 1 - window..=i].iter().sum();
                Some(sum / window as f64)
            }
        })
        .collect();
    Ok(out)
}

pub fn calculate_sma(series: &TimeSeries, window: usize) -> Result<IndicatorSeries, TradelensError> {
    let values = moving_average(&series.closes(), window)?;
    Ok(IndicatorSeries::from_values(
        IndicatorType::Sma(window),
        series,
        values,
    ))
}
