//! Portfolio-level risk and valuation.
//!
//! Value-at-risk and volatility are computed over the pooled daily returns
//! of every holding. Returns are concatenated, not weighted by position
//! size.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::config::RiskConfig;
use crate::domain::error::TradelensError;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::stats::{mean, percentile, sample_std};

/// Daily-return history of one holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingReturns {
    pub symbol: String,
    pub returns: Vec<f64>,
}

impl HoldingReturns {
    pub fn from_series(series: &TimeSeries) -> Self {
        HoldingReturns {
            symbol: series.symbol().to_string(),
            returns: series.daily_returns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMetrics {
    /// Lower-tail percentile of pooled daily returns (a fraction, usually
    /// negative).
    pub value_at_risk_5pct: f64,
    pub annualized_volatility: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub symbols: Vec<String>,
    pub metrics: RiskMetrics,
    pub snapshot: Option<PortfolioSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRiskAssessor {
    var_percentile: f64,
    annualization_factor: f64,
}

impl Default for PortfolioRiskAssessor {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}

impl PortfolioRiskAssessor {
    pub fn new(config: &RiskConfig) -> Self {
        PortfolioRiskAssessor {
            var_percentile: config.var_percentile,
            annualization_factor: config.annualization_factor,
        }
    }

    pub fn assess(&self, holdings: &[HoldingReturns]) -> Result<RiskMetrics, TradelensError> {
        let pooled: Vec<f64> = holdings
            .iter()
            .flat_map(|h| h.returns.iter().copied())
            .collect();

        let value_at_risk_5pct = percentile(&pooled, self.var_percentile)
            .ok_or(TradelensError::InsufficientData { have: 0, need: 1 })?;

        Ok(RiskMetrics {
            value_at_risk_5pct,
            annualized_volatility: sample_std(&pooled) * self.annualization_factor.sqrt(),
            sample_size: pooled.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub total_value: f64,
    /// Unweighted mean of per-holding returns, as a fraction.
    pub average_return: f64,
    pub holdings: usize,
}

/// Values holdings at their latest prices. Every holding must be priced.
pub fn portfolio_snapshot(
    holdings: &[Holding],
    latest_prices: &HashMap<String, f64>,
) -> Result<PortfolioSnapshot, TradelensError> {
    let mut total_value = 0.0;
    let mut returns = Vec::with_capacity(holdings.len());

    for holding in holdings {
        if !(holding.avg_price > 0.0) {
            return Err(TradelensError::invalid(format!(
                "average price for {} must be positive",
                holding.symbol
            )));
        }
        let price = latest_prices
            .get(&holding.symbol)
            .copied()
            .ok_or_else(|| TradelensError::data(format!("no price for {}", holding.symbol)))?;
        total_value += holding.shares * price;
        returns.push((price - holding.avg_price) / holding.avg_price);
    }

    Ok(PortfolioSnapshot {
        total_value,
        average_return: mean(&returns),
        holdings: holdings.len(),
    })
}
