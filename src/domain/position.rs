//! Open positions and completed round trips.

use chrono::NaiveDate;
use serde::Serialize;

/// A long holding. `size` may be fractional when the engine is configured
/// for fractional shares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub size: f64,
    pub stop_loss: Option<f64>,
    /// Commission paid when the position was opened.
    pub entry_commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    pub fn cost_basis(&self) -> f64 {
        self.size * self.entry_price + self.entry_commission
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    /// Net of commission on both legs.
    pub pnl: f64,
    pub return_pct: f64,
}

impl ClosedTrade {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            entry_price: 50.0,
            size: 100.0,
            stop_loss: Some(45.0),
            entry_commission: 10.0,
        }
    }

    #[test]
    fn market_value_and_cost_basis() {
        let pos = sample_position();
        assert!((pos.market_value(55.0) - 5500.0).abs() < f64::EPSILON);
        assert!((pos.cost_basis() - 5010.0).abs() < f64::EPSILON);
    }

    #[test]
    fn closed_trade_holding_days() {
        let trade = ClosedTrade {
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            entry_price: 50.0,
            exit_price: 55.0,
            size: 100.0,
            pnl: 485.0,
            return_pct: 9.7,
        };
        assert_eq!(trade.holding_days(), 5);
    }
}
