//! JSON report adapter implementing ReportPort.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::domain::error::TradelensError;
use crate::ports::report_port::{Report, ReportPort};

pub struct JsonReportAdapter {
    pretty: bool,
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render(&self, report: &Report<'_>) -> Result<String, TradelensError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.map_err(|e| TradelensError::Report {
            reason: format!("failed to serialize report: {e}"),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &Report<'_>, output_path: Option<&Path>) -> Result<(), TradelensError> {
        let mut body = self.render(report)?;
        body.push('\n');

        match output_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, body)?;
            }
            None => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(body.as_bytes())?;
                handle.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::overview::{HeatmapRow, MarketOverview};
    use crate::domain::sizing::PositionSizer;
    use tempfile::TempDir;

    #[test]
    fn sizing_report_shape() {
        let rec = PositionSizer::default().size(2.0, 10_000.0, 0.01).unwrap();
        let json = JsonReportAdapter::new(false)
            .render(&Report::Sizing(&rec))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["kind"], "sizing");
        assert_eq!(value["data"]["position_size"], 25.0);
        assert_eq!(value["data"]["stop_loss_distance"], 4.0);
        assert!(value["data"]["entry_price"].is_null());
    }

    #[test]
    fn writes_file_and_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("overview.json");
        let overview = MarketOverview {
            heatmap: vec![HeatmapRow {
                symbol: "AAA".into(),
                annualized_return: 0.1,
                annualized_volatility: 0.2,
            }],
            sectors: vec![],
        };

        JsonReportAdapter::default()
            .write(&Report::Overview(&overview), Some(&path))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["kind"], "overview");
        assert_eq!(value["data"]["heatmap"][0]["symbol"], "AAA");
        assert!(content.ends_with('\n'));
    }
}
