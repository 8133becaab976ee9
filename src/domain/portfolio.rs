//! Single-instrument portfolio state and equity tracking.

use chrono::NaiveDate;
use serde::Serialize;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Cash plus at most one open long position.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |pos| pos.market_value(price))
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, price: f64) -> f64 {
        let equity = self.equity(price);
        self.equity_curve.push(EquityPoint { date, equity });
        equity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn new_portfolio_is_flat() {
        let portfolio = Portfolio::new(100_000.0);
        assert!((portfolio.cash - 100_000.0).abs() < f64::EPSILON);
        assert!(portfolio.is_flat());
        assert!(portfolio.closed_trades.is_empty());
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn equity_without_position_is_cash() {
        let portfolio = Portfolio::new(5_000.0);
        assert!((portfolio.equity(123.0) - 5_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_marks_position_to_market() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.cash = 1_000.0;
        portfolio.position = Some(Position {
            entry_date: date(2),
            entry_price: 90.0,
            size: 100.0,
            stop_loss: None,
            entry_commission: 0.0,
        });
        assert!((portfolio.equity(95.0) - 10_500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn record_equity_appends_point() {
        let mut portfolio = Portfolio::new(10_000.0);
        let equity = portfolio.record_equity(date(3), 50.0);
        assert!((equity - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.equity_curve.len(), 1);
        assert_eq!(portfolio.equity_curve[0].date, date(3));
    }
}
