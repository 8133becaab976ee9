//! Bar-by-bar backtest replay.
//!
//! Per bar: update both strategy lines incrementally, evaluate the
//! crossover rule, fill any resulting trade at the close, then mark the
//! portfolio to market. A position still open after the final bar stays
//! open: it counts toward final equity but produces no closed trade.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{ensure_len, TradelensError};
use super::execution::{enter_long, exit_position, EntryResult, ExecutionConfig};
use super::metrics::Metrics;
use super::ohlcv::TimeSeries;
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{ClosedTrade, Position};
use super::signal::{CrossoverDetector, Signal, SignalKind};
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
    /// Bars per year, 252 for daily data.
    pub annualization_factor: f64,
    pub fast_window: usize,
    pub slow_window: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            execution: ExecutionConfig::default(),
            annualization_factor: 252.0,
            fast_window: 20,
            slow_window: 50,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), TradelensError> {
        if !(self.initial_capital > 0.0) {
            return Err(TradelensError::invalid("initial capital must be positive"));
        }
        if !(self.annualization_factor > 0.0) {
            return Err(TradelensError::invalid("annualization factor must be positive"));
        }
        self.execution.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<ClosedTrade>,
    /// Every signal the rule emitted, acted on or not.
    pub signals: Vec<Signal>,
    pub signals_executed: usize,
    pub open_position: Option<Position>,
    pub summary: Metrics,
}

pub fn run_backtest(
    series: &TimeSeries,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, TradelensError> {
    config.validate()?;
    ensure_len(series.len(), strategy.required_bars())?;

    let mut fast = strategy.fast.stream()?;
    let mut slow = strategy.slow.stream()?;
    let mut detector = CrossoverDetector::new(strategy.rule);
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut signals = Vec::new();
    let mut signals_executed = 0usize;
    let mut bars_in_market = 0usize;

    debug!(
        symbol = series.symbol(),
        strategy = %strategy.name,
        bars = series.len(),
        "backtest started"
    );

    for bar in series.bars() {
        let a = fast.update(bar.close);
        let b = slow.update(bar.close);

        if let Some(kind) = detector.update(a, b) {
            signals.push(Signal {
                date: bar.date,
                kind,
                price: bar.close,
                reason: crossing_reason(strategy, kind),
            });
            if act(&mut portfolio, kind, bar.close, bar.date, &config.execution) {
                signals_executed += 1;
            }
        }

        if !portfolio.is_flat() {
            bars_in_market += 1;
        }
        portfolio.record_equity(bar.date, bar.close);
    }

    let summary = Metrics::compute(&portfolio, bars_in_market, config.annualization_factor);
    let final_equity = portfolio
        .equity_curve
        .last()
        .map_or(config.initial_capital, |p| p.equity);

    debug!(
        symbol = series.symbol(),
        trades = portfolio.closed_trades.len(),
        final_equity,
        open = portfolio.position.is_some(),
        "backtest finished"
    );

    Ok(BacktestResult {
        symbol: series.symbol().to_string(),
        strategy: strategy.name.clone(),
        initial_capital: config.initial_capital,
        final_equity,
        total_return_pct: summary.total_return_pct,
        sharpe_ratio: summary.sharpe_ratio,
        equity_curve: portfolio.equity_curve,
        trades: portfolio.closed_trades,
        signals,
        signals_executed,
        open_position: portfolio.position,
        summary,
    })
}

/// Applies one signal to the portfolio. Returns whether a fill happened.
fn act(
    portfolio: &mut Portfolio,
    kind: SignalKind,
    price: f64,
    date: NaiveDate,
    execution: &ExecutionConfig,
) -> bool {
    match kind {
        SignalKind::Buy => match enter_long(portfolio, price, date, execution) {
            EntryResult::Entered { size, commission, .. } => {
                debug!(%date, price, size, commission, "entered long");
                true
            }
            EntryResult::AlreadyInvested => false,
            EntryResult::InsufficientCapital => {
                warn!(%date, price, cash = portfolio.cash, "buy skipped: cannot fund one share");
                false
            }
        },
        SignalKind::Sell => match exit_position(portfolio, price, date, execution) {
            Some(trade) => {
                debug!(%date, price, pnl = trade.pnl, "closed long");
                true
            }
            None => false,
        },
    }
}

fn crossing_reason(strategy: &Strategy, kind: SignalKind) -> String {
    let direction = match kind {
        SignalKind::Buy => "above",
        SignalKind::Sell => "below",
    };
    format!(
        "{} crosses {direction} {}",
        strategy.fast.label(),
        strategy.slow.label()
    )
}
