//! Technical analysis bundle for one symbol.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::config::AnalysisConfig;
use crate::domain::error::{ensure_len, TradelensError};
use crate::domain::indicator::{
    calculate_atr, calculate_macd, calculate_rsi, calculate_sma, IndicatorSeries, MacdSeries,
};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::signal::{Signal, SignalGenerator};
use crate::domain::sizing::SizingRecommendation;

/// Indicator values at the final bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestValues {
    pub date: NaiveDate,
    pub close: f64,
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub atr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub sma: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub macd: MacdSeries,
    pub atr: IndicatorSeries,
    pub signals: Vec<Signal>,
    pub latest: LatestValues,
}

/// Analysis bundle plus an optional sizing recommendation at the last close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAnalysis {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub sizing: Option<SizingRecommendation>,
}

pub fn analyze(series: &TimeSeries, config: &AnalysisConfig) -> Result<AnalysisReport, TradelensError> {
    ensure_len(series.len(), config.min_bars())?;

    let sma = calculate_sma(series, config.sma_window)?;
    let rsi = calculate_rsi(series, config.rsi_period)?;
    let macd = calculate_macd(series, config.macd_fast, config.macd_slow, config.macd_signal)?;
    let atr = calculate_atr(series, config.atr_period)?;
    let signals = SignalGenerator::from_config(config).generate(series)?;

    let last = series
        .last()
        .ok_or(TradelensError::InsufficientData { have: 0, need: 1 })?;
    let latest = LatestValues {
        date: last.date,
        close: last.close,
        sma: sma.latest(),
        rsi: rsi.latest(),
        macd: macd.line.latest(),
        macd_signal: macd.signal.latest(),
        macd_histogram: macd.histogram.latest(),
        atr: atr.latest(),
    };

    debug!(
        symbol = series.symbol(),
        bars = series.len(),
        signals = signals.len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        symbol: series.symbol().to_string(),
        sma,
        rsi,
        macd,
        atr,
        signals,
        latest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use crate::domain::signal::SignalKind;

    fn make_series(prices: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect();
        TimeSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn bundle_is_aligned_with_series() {
        let prices: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 / 4.0).sin() * 5.0).collect();
        let series = make_series(&prices);
        let report = analyze(&series, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.symbol, "TEST");
        for indicator in [&report.sma, &report.rsi, &report.atr, &report.macd.line] {
            assert_eq!(indicator.len(), series.len());
            assert_eq!(indicator.values[0].date, series.bars()[0].date);
        }
        assert_eq!(report.sma.warmup(), 19);
        assert_eq!(report.rsi.warmup(), 14);
        assert_eq!(report.atr.warmup(), 13);
        assert_eq!(report.latest.close, prices[79]);
        assert!(report.latest.rsi.is_some());

        let dates = series.dates();
        assert!(report.signals.iter().all(|s| dates.contains(&s.date)));
        assert!(report.signals.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn rising_series_reports_golden_cross() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let report = analyze(&make_series(&prices), &AnalysisConfig::default()).unwrap();
        assert!(report
            .signals
            .iter()
            .any(|s| s.kind == SignalKind::Buy && s.reason == "golden-cross"));
        assert!(!report.signals.iter().any(|s| s.reason == "death-cross"));
    }

    #[test]
    fn short_series_is_insufficient() {
        let series = make_series(&[100.0; 30]);
        let result = analyze(&series, &AnalysisConfig::default());
        assert!(matches!(
            result,
            Err(TradelensError::InsufficientData { have: 30, need: 50 })
        ));
    }
}
