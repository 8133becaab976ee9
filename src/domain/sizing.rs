//! ATR-based position sizing.
//!
//! stopLossDistance = ATR * multiplier
//! riskAmount       = equity * fraction
//! positionSize     = riskAmount / stopLossDistance

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::config::SizingConfig;
use crate::domain::error::{ensure_len, TradelensError};
use crate::domain::indicator::calculate_atr;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingRecommendation {
    pub atr: f64,
    pub position_size: f64,
    pub stop_loss_distance: f64,
    pub risk_amount: f64,
    /// Set when the recommendation was derived from a series.
    pub entry_date: Option<NaiveDate>,
    pub entry_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
}

impl SizingRecommendation {
    /// Materializes the recommendation at its entry price.
    pub fn to_position(&self) -> Option<Position> {
        Some(Position {
            entry_date: self.entry_date?,
            entry_price: self.entry_price?,
            size: self.position_size,
            stop_loss: self.stop_loss_price,
            entry_commission: 0.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSizer {
    atr_period: usize,
    atr_multiplier: f64,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self::new(&SizingConfig::default())
    }
}

impl PositionSizer {
    pub fn new(config: &SizingConfig) -> Self {
        PositionSizer {
            atr_period: config.atr_period,
            atr_multiplier: config.atr_multiplier,
        }
    }

    /// Sizes a position from an already-known ATR value.
    pub fn size(
        &self,
        atr: f64,
        equity: f64,
        fraction: f64,
    ) -> Result<SizingRecommendation, TradelensError> {
        if !(atr > 0.0) {
            return Err(TradelensError::invalid(format!("ATR must be positive, got {atr}")));
        }
        if !(equity > 0.0) {
            return Err(TradelensError::invalid(format!(
                "equity must be positive, got {equity}"
            )));
        }
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(TradelensError::invalid(format!(
                "risk fraction must be in (0, 1], got {fraction}"
            )));
        }
        if !(self.atr_multiplier > 0.0) {
            return Err(TradelensError::invalid("ATR multiplier must be positive"));
        }

        let stop_loss_distance = atr * self.atr_multiplier;
        let risk_amount = equity * fraction;
        Ok(SizingRecommendation {
            atr,
            position_size: risk_amount / stop_loss_distance,
            stop_loss_distance,
            risk_amount,
            entry_date: None,
            entry_price: None,
            stop_loss_price: None,
        })
    }

    /// Sizes a position at the last close using the series' latest ATR.
    pub fn recommend(
        &self,
        series: &TimeSeries,
        equity: f64,
        fraction: f64,
    ) -> Result<SizingRecommendation, TradelensError> {
        ensure_len(series.len(), self.atr_period.max(1))?;
        let atr = calculate_atr(series, self.atr_period)?;
        let latest = atr.latest().ok_or(TradelensError::InsufficientData {
            have: series.len(),
            need: self.atr_period,
        })?;

        let mut rec = self.size(latest, equity, fraction)?;
        if let Some(bar) = series.last() {
            rec.entry_date = Some(bar.date);
            rec.entry_price = Some(bar.close);
            rec.stop_loss_price = Some(bar.close - rec.stop_loss_distance);
        }
        Ok(rec)
    }
}
