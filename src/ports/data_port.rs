//! Market data access port trait.

use crate::domain::error::TradelensError;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::timeframe::Timeframe;

pub trait MarketDataPort {
    /// Daily bars for `symbol` covering `timeframe`, oldest first.
    fn fetch_series(&self, symbol: &str, timeframe: Timeframe) -> Result<TimeSeries, TradelensError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradelensError>;
}
