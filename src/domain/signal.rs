//! Crossover and threshold signal generation.
//!
//! A crossover rule tracks the relative position of two lines. The state
//! only moves on a strict inequality: an exact tie, or a bar where either
//! line is still warming up, leaves the previous state in place.
//! Threshold rules (RSI) are level checks and fire on every qualifying bar.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::domain::config::AnalysisConfig;
use crate::domain::error::TradelensError;
use crate::domain::indicator::relative_strength_index;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::strategy::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Buy,
    Sell,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub kind: SignalKind,
    pub price: f64,
    pub reason: String,
}

/// Position of line A relative to line B at the previous step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CrossState {
    Above,
    Below,
    Unknown,
}

/// Maps a state transition to an optional signal.
pub type CrossoverRule = fn(CrossState, CrossState) -> Option<SignalKind>;

/// Below/Unknown → Above is a Buy, Above/Unknown → Below is a Sell.
pub fn crossover_transition(previous: CrossState, current: CrossState) -> Option<SignalKind> {
    match (previous, current) {
        (CrossState::Above, CrossState::Above) | (CrossState::Below, CrossState::Below) => None,
        (_, CrossState::Above) => Some(SignalKind::Buy),
        (_, CrossState::Below) => Some(SignalKind::Sell),
        (_, CrossState::Unknown) => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CrossoverDetector {
    state: CrossState,
    rule: CrossoverRule,
}

impl Default for CrossoverDetector {
    fn default() -> Self {
        Self::new(crossover_transition)
    }
}

impl CrossoverDetector {
    pub fn new(rule: CrossoverRule) -> Self {
        Self {
            state: CrossState::Unknown,
            rule,
        }
    }

    pub fn state(&self) -> CrossState {
        self.state
    }

    pub fn update(&mut self, a: Option<f64>, b: Option<f64>) -> Option<SignalKind> {
        let (Some(a), Some(b)) = (a, b) else {
            return None;
        };
        let current = if a > b {
            CrossState::Above
        } else if a < b {
            CrossState::Below
        } else {
            self.state
        };
        let signal = (self.rule)(self.state, current);
        self.state = current;
        signal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalRule {
    Crossover {
        fast: Line,
        slow: Line,
        bullish: String,
        bearish: String,
    },
    RsiThreshold {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
}

impl SignalRule {
    pub fn price_crosses_ma(window: usize) -> Self {
        SignalRule::Crossover {
            fast: Line::Close,
            slow: Line::sma(window),
            bullish: format!("price-crosses-above-MA{window}"),
            bearish: format!("price-crosses-below-MA{window}"),
        }
    }

    pub fn golden_cross(fast: usize, slow: usize) -> Self {
        SignalRule::Crossover {
            fast: Line::sma(fast),
            slow: Line::sma(slow),
            bullish: "golden-cross".into(),
            bearish: "death-cross".into(),
        }
    }

    pub fn macd_crossover(fast: usize, slow: usize, signal: usize) -> Self {
        SignalRule::Crossover {
            fast: Line::macd_line(fast, slow, signal),
            slow: Line::macd_signal(fast, slow, signal),
            bullish: "MACD-bullish-crossover".into(),
            bearish: "MACD-bearish-crossover".into(),
        }
    }

    pub fn rsi_threshold(period: usize, oversold: f64, overbought: f64) -> Self {
        SignalRule::RsiThreshold {
            period,
            oversold,
            overbought,
        }
    }

    /// Bars needed before every line of the rule is computable.
    pub fn window(&self) -> usize {
        match self {
            SignalRule::Crossover { fast, slow, .. } => fast.window().max(slow.window()),
            SignalRule::RsiThreshold { period, .. } => *period,
        }
    }
}

/// Precomputed per-rule inputs plus crossover state.
enum Prepared<'a> {
    Crossover {
        a: Vec<Option<f64>>,
        b: Vec<Option<f64>>,
        detector: CrossoverDetector,
        bullish: &'a str,
        bearish: &'a str,
    },
    Threshold {
        rsi: Vec<Option<f64>>,
        oversold: f64,
        overbought: f64,
    },
}

/// Runs a fixed list of rules over a series. Signals for the same bar are
/// emitted in rule-registration order.
#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    rules: Vec<SignalRule>,
}

impl SignalGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: SignalRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Price×MA, golden/death cross, MACD crossover, RSI thresholds.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new()
            .with_rule(SignalRule::price_crosses_ma(config.sma_window))
            .with_rule(SignalRule::golden_cross(config.ma_short, config.ma_long))
            .with_rule(SignalRule::macd_crossover(
                config.macd_fast,
                config.macd_slow,
                config.macd_signal,
            ))
            .with_rule(SignalRule::rsi_threshold(
                config.rsi_period,
                config.rsi_oversold,
                config.rsi_overbought,
            ))
    }

    pub fn generate(&self, series: &TimeSeries) -> Result<Vec<Signal>, TradelensError> {
        let closes = series.closes();
        let mut prepared = self
            .rules
            .iter()
            .map(|rule| prepare(rule, series, &closes))
            .collect::<Result<Vec<_>, _>>()?;

        let mut signals = Vec::new();
        for (i, bar) in series.bars().iter().enumerate() {
            for rule in prepared.iter_mut() {
                let emitted = match rule {
                    Prepared::Crossover {
                        a,
                        b,
                        detector,
                        bullish,
                        bearish,
                    } => detector.update(a[i], b[i]).map(|kind| {
                        let reason = match kind {
                            SignalKind::Buy => *bullish,
                            SignalKind::Sell => *bearish,
                        };
                        (kind, reason)
                    }),
                    Prepared::Threshold {
                        rsi,
                        oversold,
                        overbought,
                    } => match rsi[i] {
                        Some(v) if v < *oversold => Some((SignalKind::Buy, "oversold")),
                        Some(v) if v > *overbought => Some((SignalKind::Sell, "overbought")),
                        _ => None,
                    },
                };

                if let Some((kind, reason)) = emitted {
                    debug!(symbol = series.symbol(), date = %bar.date, %kind, reason, "signal");
                    signals.push(Signal {
                        date: bar.date,
                        kind,
                        price: bar.close,
                        reason: reason.to_string(),
                    });
                }
            }
        }
        Ok(signals)
    }
}

fn prepare<'a>(
    rule: &'a SignalRule,
    series: &TimeSeries,
    closes: &[f64],
) -> Result<Prepared<'a>, TradelensError> {
    match rule {
        SignalRule::Crossover {
            fast,
            slow,
            bullish,
            bearish,
        } => Ok(Prepared::Crossover {
            a: fast.compute(series)?,
            b: slow.compute(series)?,
            detector: CrossoverDetector::default(),
            bullish: bullish.as_str(),
            bearish: bearish.as_str(),
        }),
        SignalRule::RsiThreshold {
            period,
            oversold,
            overbought,
        } => Ok(Prepared::Threshold {
            rsi: relative_strength_index(closes, *period)?,
            oversold: *oversold,
            overbought: *overbought,
        }),
    }
}
