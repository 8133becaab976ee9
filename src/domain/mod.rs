//! Core domain types and logic.

pub mod analysis;
pub mod backtest;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod overview;
pub mod portfolio;
pub mod position;
pub mod risk;
pub mod signal;
pub mod sizing;
pub mod stats;
pub mod strategy;
pub mod timeframe;
