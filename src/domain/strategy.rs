//! Strategy description for the backtest engine.
//!
//! A strategy is plain data: two lines to compare and the transition
//! function that turns their crossings into signals.

use std::str::FromStr;

use serde::Serialize;

use crate::domain::error::TradelensError;
use crate::domain::indicator::streaming::{ExpSmoother, RollingMean};
use crate::domain::indicator::{exponential_moving_average, macd, moving_average, IndicatorType};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::signal::{crossover_transition, CrossoverRule};

/// A per-bar numeric line: the close itself or an indicator of the close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Close,
    Indicator(IndicatorType),
}

impl Line {
    pub fn sma(window: usize) -> Self {
        Line::Indicator(IndicatorType::Sma(window))
    }

    pub fn ema(span: usize) -> Self {
        Line::Indicator(IndicatorType::Ema(span))
    }

    pub fn macd_line(fast: usize, slow: usize, signal: usize) -> Self {
        Line::Indicator(IndicatorType::MacdLine { fast, slow, signal })
    }

    pub fn macd_signal(fast: usize, slow: usize, signal: usize) -> Self {
        Line::Indicator(IndicatorType::MacdSignal { fast, slow, signal })
    }

    pub fn window(&self) -> usize {
        match self {
            Line::Close => 1,
            Line::Indicator(t) => t.window(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Line::Close => "CLOSE".to_string(),
            Line::Indicator(t) => t.to_string(),
        }
    }

    /// Batch values over the whole series.
    pub fn compute(&self, series: &TimeSeries) -> Result<Vec<Option<f64>>, TradelensError> {
        let closes = series.closes();
        match *self {
            Line::Close => Ok(closes.into_iter().map(Some).collect()),
            Line::Indicator(IndicatorType::Sma(window)) => moving_average(&closes, window),
            Line::Indicator(IndicatorType::Ema(span)) => {
                Ok(exponential_moving_average(&closes, span)?
                    .into_iter()
                    .map(Some)
                    .collect())
            }
            Line::Indicator(IndicatorType::MacdLine { fast, slow, signal }) => {
                Ok(macd(&closes, fast, slow, signal)?.line.into_iter().map(Some).collect())
            }
            Line::Indicator(IndicatorType::MacdSignal { fast, slow, signal }) => {
                Ok(macd(&closes, fast, slow, signal)?.signal.into_iter().map(Some).collect())
            }
            Line::Indicator(other) => Err(TradelensError::invalid(format!(
                "{other} is not a price line"
            ))),
        }
    }

    /// Fresh incremental state producing the same values as [`Line::compute`].
    pub fn stream(&self) -> Result<LineState, TradelensError> {
        match *self {
            Line::Close => Ok(LineState::Close),
            Line::Indicator(IndicatorType::Sma(window)) => {
                Ok(LineState::Sma(RollingMean::new(window)?))
            }
            Line::Indicator(IndicatorType::Ema(span)) => Ok(LineState::Ema(ExpSmoother::new(span)?)),
            Line::Indicator(IndicatorType::MacdLine { fast, slow, signal })
            | Line::Indicator(IndicatorType::MacdSignal { fast, slow, signal }) => {
                Ok(LineState::Macd {
                    fast: ExpSmoother::new(fast)?,
                    slow: ExpSmoother::new(slow)?,
                    signal: ExpSmoother::new(signal)?,
                    want_signal: matches!(self, Line::Indicator(IndicatorType::MacdSignal { .. })),
                })
            }
            Line::Indicator(other) => Err(TradelensError::invalid(format!(
                "{other} is not a price line"
            ))),
        }
    }
}

impl Serialize for Line {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// Incremental state for one [`Line`], fed one close at a time.
#[derive(Debug, Clone)]
pub enum LineState {
    Close,
    Sma(RollingMean),
    Ema(ExpSmoother),
    Macd {
        fast: ExpSmoother,
        slow: ExpSmoother,
        signal: ExpSmoother,
        want_signal: bool,
    },
}

impl LineState {
    pub fn update(&mut self, close: f64) -> Option<f64> {
        match self {
            LineState::Close => Some(close),
            LineState::Sma(mean) => mean.update(close),
            LineState::Ema(ema) => Some(ema.update(close)),
            LineState::Macd {
                fast,
                slow,
                signal,
                want_signal,
            } => {
                let line = fast.update(close) - slow.update(close);
                let sig = signal.update(line);
                Some(if *want_signal { sig } else { line })
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Strategy {
    pub name: String,
    pub fast: Line,
    pub slow: Line,
    #[serde(skip)]
    pub rule: CrossoverRule,
}

impl Strategy {
    pub fn new(name: impl Into<String>, fast: Line, slow: Line) -> Self {
        Strategy {
            name: name.into(),
            fast,
            slow,
            rule: crossover_transition,
        }
    }

    pub fn with_rule(mut self, rule: CrossoverRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn golden_cross(fast: usize, slow: usize) -> Self {
        Self::new(
            format!("SMA({fast})/SMA({slow}) crossover"),
            Line::sma(fast),
            Line::sma(slow),
        )
    }

    pub fn ema_crossover(fast: usize, slow: usize) -> Self {
        Self::new(
            format!("EMA({fast})/EMA({slow}) crossover"),
            Line::ema(fast),
            Line::ema(slow),
        )
    }

    pub fn price_crosses_ma(window: usize) -> Self {
        Self::new(format!("close/SMA({window}) crossover"), Line::Close, Line::sma(window))
    }

    pub fn macd_crossover(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(
            format!("MACD({fast},{slow},{signal}) signal crossover"),
            Line::macd_line(fast, slow, signal),
            Line::macd_signal(fast, slow, signal),
        )
    }

    /// Longest indicator window the strategy needs.
    pub fn required_bars(&self) -> usize {
        self.fast.window().max(self.slow.window())
    }
}

/// Named strategy families selectable from config or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    GoldenCross,
    EmaCrossover,
    PriceCrossesMa,
    MacdCrossover,
}

impl StrategyKind {
    /// `price_crosses_ma` uses only `fast`; `macd_crossover` uses the
    /// standard 9-bar signal span.
    pub fn build(self, fast: usize, slow: usize) -> Strategy {
        match self {
            StrategyKind::GoldenCross => Strategy::golden_cross(fast, slow),
            StrategyKind::EmaCrossover => Strategy::ema_crossover(fast, slow),
            StrategyKind::PriceCrossesMa => Strategy::price_crosses_ma(fast),
            StrategyKind::MacdCrossover => {
                Strategy::macd_crossover(fast, slow, macd::DEFAULT_SIGNAL)
            }
        }
    }
}

impl FromStr for StrategyKind {
    type Err = TradelensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "golden_cross" | "golden" | "sma" => Ok(StrategyKind::GoldenCross),
            "ema_crossover" | "ema" => Ok(StrategyKind::EmaCrossover),
            "price_crosses_ma" | "price_ma" => Ok(StrategyKind::PriceCrossesMa),
            "macd_crossover" | "macd" => Ok(StrategyKind::MacdCrossover),
            other => Err(TradelensError::invalid(format!(
                "unknown strategy '{other}' (expected golden_cross, ema_crossover, price_crosses_ma, macd_crossover)"
            ))),
        }
    }
}
