//! Market overview rows: per-symbol return/volatility heatmap and sector
//! performance.

use serde::Serialize;

use crate::domain::error::{ensure_len, TradelensError};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::stats::{mean, sample_std};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub symbol: String,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorRow {
    pub sector: String,
    pub symbol: String,
    pub performance: f64,
    pub last_price: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MarketOverview {
    pub heatmap: Vec<HeatmapRow>,
    pub sectors: Vec<SectorRow>,
}

pub fn heatmap_row(series: &TimeSeries) -> Result<HeatmapRow, TradelensError> {
    ensure_len(series.len(), 2)?;
    let returns = series.daily_returns();
    Ok(HeatmapRow {
        symbol: series.symbol().to_string(),
        annualized_return: mean(&returns) * TRADING_DAYS_PER_YEAR,
        annualized_volatility: sample_std(&returns) * TRADING_DAYS_PER_YEAR.sqrt(),
    })
}

pub fn sector_row(sector: &str, series: &TimeSeries) -> Result<SectorRow, TradelensError> {
    ensure_len(series.len(), 2)?;
    let last_price = series.last().map_or(0.0, |bar| bar.close);
    Ok(SectorRow {
        sector: sector.to_string(),
        symbol: series.symbol().to_string(),
        performance: mean(&series.daily_returns()) * TRADING_DAYS_PER_YEAR,
        last_price,
    })
}
