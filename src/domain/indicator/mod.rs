//! Technical indicator implementations.
//!
//! Every indicator has two faces:
//! - a pure numeric function over `&[f64]` columns (`moving_average`,
//!   `exponential_moving_average`, `relative_strength_index`, `macd`,
//!   `average_true_range`), returning one output per input;
//! - a `calculate_*` wrapper over a [`TimeSeries`] that returns an
//!   [`IndicatorSeries`] aligned 1:1 with the bars.
//!
//! Warm-up entries are `None`. The [`streaming`] module holds bar-by-bar
//! counterparts whose outputs equal the batch functions exactly.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod streaming;

pub use atr::{average_true_range, calculate_atr, true_range};
pub use ema::{calculate_ema, ema_alpha, exponential_moving_average};
pub use macd::{calculate_macd, macd, MacdOutput, MacdSeries};
pub use rsi::{calculate_rsi, relative_strength_index};
pub use sma::{calculate_sma, moving_average};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::domain::error::TradelensError;
use crate::domain::ohlcv::TimeSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    MacdLine {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdHistogram {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    /// The longest lookback parameter of the indicator, in bars.
    pub fn window(&self) -> usize {
        match *self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::Rsi(n)
            | IndicatorType::Atr(n) => n,
            IndicatorType::MacdLine { fast, slow, signal }
            | IndicatorType::MacdSignal { fast, slow, signal }
            | IndicatorType::MacdHistogram { fast, slow, signal } => {
                fast.max(slow).max(signal)
            }
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::MacdLine { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdHistogram { fast, slow, signal } => {
                write!(f, "MACD_HIST({},{},{})", fast, slow, signal)
            }
        }
    }
}

impl Serialize for IndicatorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An indicator aligned 1:1 with the bars of its source series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn from_values(
        indicator_type: IndicatorType,
        series: &TimeSeries,
        values: Vec<Option<f64>>,
    ) -> Self {
        let values = series
            .bars()
            .iter()
            .zip(values)
            .map(|(bar, value)| IndicatorPoint {
                date: bar.date,
                value,
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    /// Value at the final bar, if it is past warm-up.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().and_then(|p| p.value)
    }

    /// Number of leading undefined points.
    pub fn warmup(&self) -> usize {
        self.values.iter().take_while(|p| p.value.is_none()).count()
    }
}

/// Validates a trailing-window parameter against the input length.
pub(crate) fn check_window(name: &str, window: usize, len: usize) -> Result<(), TradelensError> {
    if len == 0 {
        return Err(TradelensError::InsufficientData {
            have: 0,
            need: window.max(1),
        });
    }
    if window == 0 {
        return Err(TradelensError::invalid(format!("{name} must be positive")));
    }
    if window > len {
        return Err(TradelensError::invalid(format!(
            "{name} {window} exceeds series length {len}"
        )));
    }
    Ok(())
}
