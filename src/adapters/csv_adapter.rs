//! CSV file market data adapter.
//!
//! One file per symbol, `<data_dir>/<SYMBOL>.csv`, with a header row of
//! `date,open,high,low,close,volume` (capitalized headers as exported by
//! common quote sites are accepted; extra columns are ignored).

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::error::TradelensError;
use crate::domain::ohlcv::{Bar, TimeSeries};
use crate::domain::timeframe::Timeframe;
use crate::ports::data_port::MarketDataPort;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

impl From<CsvRow> for Bar {
    fn from(row: CsvRow) -> Self {
        Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.round() as i64,
        }
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<Bar>, TradelensError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            TradelensError::data(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| {
                TradelensError::data(format!("{}: row {}: {}", path.display(), line + 1, e))
            })?;
            bars.push(Bar::from(row));
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str, timeframe: Timeframe) -> Result<TimeSeries, TradelensError> {
        let mut bars = self.read_bars(symbol)?;

        let start = bars
            .last()
            .and_then(|last| timeframe.start_date(last.date));
        if let Some(start) = start {
            bars.retain(|b| b.date >= start);
        }

        TimeSeries::new(symbol, bars)
            .map_err(|e| TradelensError::data(format!("{symbol}: {e}")))
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradelensError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            TradelensError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| TradelensError::data(format!("directory entry error: {e}")))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
