//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! Every component is defined from the first bar.

use serde::Serialize;

use crate::domain::error::TradelensError;
use crate::domain::indicator::{exponential_moving_average, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::TimeSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdOutput, TradelensError> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Err(TradelensError::invalid(format!(
            "MACD periods must be positive (got {fast},{slow},{signal_period})"
        )));
    }

    let ema_fast = exponential_moving_average(values, fast)?;
    let ema_slow = exponential_moving_average(values, slow)?;
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = exponential_moving_average(&line, signal_period)?;
    let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    Ok(MacdOutput {
        line,
        signal,
        histogram,
    })
}

pub fn calculate_macd(
    series: &TimeSeries,
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdSeries, TradelensError> {
    let out = macd(&series.closes(), fast, slow, signal_period)?;
    let wrap = |indicator_type, values: Vec<f64>| {
        IndicatorSeries::from_values(indicator_type, series, values.into_iter().map(Some).collect())
    };

    Ok(MacdSeries {
        line: wrap(
            IndicatorType::MacdLine {
                fast,
                slow,
                signal: signal_period,
            },
            out.line,
        ),
        signal: wrap(
            IndicatorType::MacdSignal {
                fast,
                slow,
                signal: signal_period,
            },
            out.signal,
        ),
        histogram: wrap(
            IndicatorType::MacdHistogram {
                fast,
                slow,
                signal: signal_period,
            },
            out.histogram,
        ),
    })
}

pub fn calculate_macd_default(series: &TimeSeries) -> Result<MacdSeries, TradelensError> {
    calculate_macd(series, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
