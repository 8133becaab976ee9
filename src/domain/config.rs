//! Explicit configuration records passed into each component.
//!
//! Values are read from INI sections by the CLI layer; every struct has a
//! `Default` carrying the stock parameters.

use serde::Serialize;

use crate::domain::indicator::{atr, macd, rsi};
use crate::domain::risk::Holding;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub sma_window: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub ma_short: usize,
    pub ma_long: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            sma_window: 20,
            rsi_period: rsi::DEFAULT_PERIOD,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            atr_period: atr::DEFAULT_PERIOD,
            ma_short: 20,
            ma_long: 50,
        }
    }
}

impl AnalysisConfig {
    /// Bars needed before every configured window fits in the series.
    pub fn min_bars(&self) -> usize {
        [
            self.sma_window,
            self.rsi_period + 1,
            self.atr_period,
            self.ma_short,
            self.ma_long,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingConfig {
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub account_size: f64,
    pub risk_per_trade: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            atr_period: atr::DEFAULT_PERIOD,
            atr_multiplier: 2.0,
            account_size: 10_000.0,
            risk_per_trade: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskConfig {
    pub var_percentile: f64,
    pub annualization_factor: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            var_percentile: 5.0,
            annualization_factor: 252.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataConfig {
    pub data_dir: String,
    pub timeframe: String,
    pub symbols: Vec<String>,
    /// (sector name, tracking symbol) pairs for the sector overview.
    pub sectors: Vec<(String, String)>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_dir: "data".into(),
            timeframe: "6mo".into(),
            symbols: Vec::new(),
            sectors: Vec::new(),
        }
    }
}

/// Holdings valued by the `risk` command.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PortfolioConfig {
    pub holdings: Vec<Holding>,
}

impl PortfolioConfig {
    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }
}
