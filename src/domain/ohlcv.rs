//! OHLCV bar and time series representation.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::TradelensError;
use crate::domain::stats::pct_changes;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    fn prices(&self) -> [(&'static str, f64); 4] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
    }
}

/// Ordered bars for one symbol. Dates are strictly increasing and every
/// price is finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl TimeSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, TradelensError> {
        let symbol = symbol.into();
        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(TradelensError::invalid(format!(
                "{symbol}: bar dates must be strictly increasing ({} followed by {})",
                w[0].date, w[1].date
            )));
        }
        for bar in &bars {
            let bad = bar
                .prices()
                .into_iter()
                .find(|(_, v)| !(v.is_finite() && *v > 0.0));
            if let Some((field, value)) = bad {
                return Err(TradelensError::invalid(format!(
                    "{symbol}: {field} on {} must be a positive finite price, got {value}",
                    bar.date
                )));
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// The first `n` bars as a new series (clamped to the series length).
    pub fn prefix(&self, n: usize) -> TimeSeries {
        TimeSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[..n.min(self.bars.len())].to_vec(),
        }
    }

    /// Close-to-close percentage changes; one shorter than the series.
    pub fn daily_returns(&self) -> Vec<f64> {
        pct_changes(&self.closes())
    }
}
