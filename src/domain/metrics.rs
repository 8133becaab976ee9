//! Performance statistics derived from a finished replay.

use serde::Serialize;

use super::portfolio::{EquityPoint, Portfolio};
use super::stats::{mean, pct_changes, sample_std};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a previous peak.
    pub max_drawdown_duration: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    /// Gross profit over gross loss. `None` when no closed trade lost money.
    pub profit_factor: Option<f64>,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
    /// Fraction of bars with an open position.
    pub exposure: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, bars_in_market: usize, annualization_factor: f64) -> Self {
        let equity_curve = &portfolio.equity_curve;
        let trades = &portfolio.closed_trades;
        let initial_capital = portfolio.initial_capital;

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let total_return_pct = if initial_capital > 0.0 {
            (final_equity / initial_capital - 1.0) * 100.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);
        let sharpe_ratio = sharpe_ratio(equity_curve, annualization_factor);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_duration_days = 0i64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_duration_days += trade.holding_days();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = (total_losses > 0.0).then(|| total_wins / total_losses);

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };
        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };
        let avg_trade_duration = if total_trades > 0 {
            total_duration_days as f64 / total_trades as f64
        } else {
            0.0
        };

        let exposure = if equity_curve.is_empty() {
            0.0
        } else {
            bars_in_market as f64 / equity_curve.len() as f64
        };

        Metrics {
            total_return_pct,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_trade_duration,
            exposure,
        }
    }
}

/// Annualized mean/std of bar-to-bar equity returns; 0 when std is 0.
pub fn sharpe_ratio(equity_curve: &[EquityPoint], annualization_factor: f64) -> f64 {
    let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
    let returns = pct_changes(&equity);
    let std = sample_std(&returns);
    if std == 0.0 {
        return 0.0;
    }
    mean(&returns) / std * annualization_factor.sqrt()
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}
