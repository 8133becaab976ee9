//! Fill simulation for the backtest.
//!
//! Fills happen at the bar close. A fixed fractional commission is charged
//! on the notional of both legs; there is no slippage model.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::TradelensError;
use super::portfolio::Portfolio;
use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionConfig {
    /// Fraction of notional, e.g. 0.002 for 0.2%.
    pub commission_rate: f64,
    pub fractional_shares: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.002,
            fractional_shares: false,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), TradelensError> {
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(TradelensError::invalid(format!(
                "commission rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

pub fn calculate_commission(notional: f64, config: &ExecutionConfig) -> f64 {
    notional * config.commission_rate
}

/// Largest size whose notional plus commission fits in `cash`.
pub fn affordable_size(cash: f64, price: f64, config: &ExecutionConfig) -> f64 {
    if cash <= 0.0 || price <= 0.0 {
        return 0.0;
    }
    let size = cash / (price * (1.0 + config.commission_rate));
    if config.fractional_shares {
        size
    } else {
        size.floor()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        size: f64,
        notional: f64,
        commission: f64,
    },
    AlreadyInvested,
    InsufficientCapital,
}

/// Opens a full-equity long position at `price`.
pub fn enter_long(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> EntryResult {
    if !portfolio.is_flat() {
        return EntryResult::AlreadyInvested;
    }

    let size = affordable_size(portfolio.cash, price, config);
    if size <= 0.0 {
        return EntryResult::InsufficientCapital;
    }

    let notional = size * price;
    let commission = calculate_commission(notional, config);
    portfolio.cash -= notional + commission;
    portfolio.position = Some(Position {
        entry_date: date,
        entry_price: price,
        size,
        stop_loss: None,
        entry_commission: commission,
    });

    EntryResult::Entered {
        size,
        notional,
        commission,
    }
}

/// Closes the open position at `price`, crediting proceeds net of
/// commission and recording the round trip. Returns `None` when flat.
pub fn exit_position(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> Option<ClosedTrade> {
    let position = portfolio.position.take()?;

    let proceeds = position.market_value(price);
    let commission = calculate_commission(proceeds, config);
    portfolio.cash += proceeds - commission;

    let cost = position.cost_basis();
    let pnl = proceeds - commission - cost;
    let return_pct = if cost > 0.0 { pnl / cost * 100.0 } else { 0.0 };

    let trade = ClosedTrade {
        entry_date: position.entry_date,
        exit_date: date,
        entry_price: position.entry_price,
        exit_price: price,
        size: position.size,
        pnl,
        return_pct,
    };
    portfolio.record_trade(trade.clone());
    Some(trade)
}
