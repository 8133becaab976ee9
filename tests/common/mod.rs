#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
pub use tradelens::domain::ohlcv::{Bar, TimeSeries};
use tradelens::domain::error::TradelensError;
use tradelens::domain::timeframe::Timeframe;
use tradelens::ports::data_port::MarketDataPort;

/// In-memory market data. Ignores the timeframe and returns every bar.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: &[f64]) -> Self {
        self.data.insert(symbol.to_string(), make_bars(prices));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_series(&self, symbol: &str, _timeframe: Timeframe) -> Result<TimeSeries, TradelensError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradelensError::data(reason.clone()));
        }
        let bars = self
            .data
            .get(symbol)
            .cloned()
            .ok_or_else(|| TradelensError::data(format!("unknown symbol {symbol}")))?;
        TimeSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradelensError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days from 2024-01-01, high/low one point either
/// side of the close.
pub fn make_bars(prices: &[f64]) -> Vec<Bar> {
    let start = date(2024, 1, 1);
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        })
        .collect()
}

pub fn make_series(symbol: &str, prices: &[f64]) -> TimeSeries {
    TimeSeries::new(symbol, make_bars(prices)).unwrap()
}

pub fn flat(count: usize, price: f64) -> Vec<f64> {
    vec![price; count]
}

pub fn rising(count: usize) -> Vec<f64> {
    (0..count).map(|i| 100.0 + i as f64).collect()
}

pub fn wave(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + (i as f64 / 6.0).sin() * 8.0 + i as f64 * 0.05)
        .collect()
}

/// Writes `<dir>/<symbol>.csv` in the `date,open,high,low,close,volume` layout.
pub fn write_csv(dir: &std::path::Path, symbol: &str, prices: &[f64]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in make_bars(prices) {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
