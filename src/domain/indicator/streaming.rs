//! Bar-by-bar indicator state.
//!
//! Each accumulator reproduces its batch counterpart bit for bit: the
//! rolling mean sums the same window in the same order, and the smoother
//! applies the same recurrence expression.

use std::collections::VecDeque;

use crate::domain::error::TradelensError;

/// Trailing arithmetic mean over a fixed window.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    buf: VecDeque<f64>,
}

impl RollingMean {
    pub fn new(window: usize) -> Result<Self, TradelensError> {
        if window == 0 {
            return Err(TradelensError::invalid("window must be positive"));
        }
        Ok(Self {
            window,
            buf: VecDeque::with_capacity(window),
        })
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.buf.push_back(value);
        if self.buf.len() > self.window {
            self.buf.pop_front();
        }
        if self.buf.len() == self.window {
            let sum: f64 = self.buf.iter().sum();
            Some(sum / self.window as f64)
        } else {
            None
        }
    }
}

/// Exponential smoothing seeded with the first observation.
#[derive(Debug, Clone)]
pub struct ExpSmoother {
    alpha: f64,
    prev: Option<f64>,
}

impl ExpSmoother {
    pub fn new(span: usize) -> Result<Self, TradelensError> {
        if span == 0 {
            return Err(TradelensError::invalid("span must be positive"));
        }
        Ok(Self {
            alpha: super::ema_alpha(span),
            prev: None,
        })
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.prev {
            None => value,
            Some(prev) => value * self.alpha + prev * (1.0 - self.alpha),
        };
        self.prev = Some(next);
        next
    }
}
