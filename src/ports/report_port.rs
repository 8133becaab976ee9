//! Report output port trait.

use std::path::Path;

use serde::Serialize;

use crate::domain::analysis::SymbolAnalysis;
use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradelensError;
use crate::domain::overview::MarketOverview;
use crate::domain::risk::RiskReport;
use crate::domain::sizing::SizingRecommendation;

/// Every payload the dashboard collaborator consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Report<'a> {
    Analysis(&'a [SymbolAnalysis]),
    Backtest(&'a [BacktestResult]),
    Sizing(&'a SizingRecommendation),
    Risk(&'a RiskReport),
    Overview(&'a MarketOverview),
}

/// Port for writing result bundles. `None` means standard output.
pub trait ReportPort {
    fn write(&self, report: &Report<'_>, output_path: Option<&Path>) -> Result<(), TradelensError>;
}
