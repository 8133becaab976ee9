//! Exponential Moving Average indicator.
//!
//! alpha = 2/(n+1), EMA[0] = C[0], EMA[i] = C[i]*alpha + EMA[i-1]*(1-alpha).
//! Defined from the first bar; there is no warm-up gap.

use crate::domain::error::TradelensError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::TimeSeries;

pub fn ema_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

pub fn exponential_moving_average(values: &[f64], span: usize) -> Result<Vec<f64>, TradelensError> {
    if values.is_empty() {
        return Err(TradelensError::InsufficientData { have: 0, need: 1 });
    }
    if span == 0 {
        return Err(TradelensError::invalid("span must be positive"));
    }

    let alpha = ema_alpha(span);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);
    for &value in &values[1..] {
        ema = value * alpha + ema * (1.0 - alpha);
        out.push(ema);
    }
    Ok(out)
}

pub fn calculate_ema(series: &TimeSeries, span: usize) -> Result<IndicatorSeries, TradelensError> {
    let values = exponential_moving_average(&series.closes(), span)?;
    Ok(IndicatorSeries::from_values(
        IndicatorType::Ema(span),
        series,
        values.into_iter().map(Some).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_series(prices: &[f64]) -> TimeSeries {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect();
        TimeSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn ema_no_warmup() {
        let series = make_series(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let ema = calculate_ema(&series, 3).unwrap();
        assert_eq!(ema.warmup(), 0);
        assert_eq!(ema.value_at(0), Some(10.0));
    }

    #[test]
    fn ema_recursive_calculation() {
        let out = exponential_moving_average(&[10.0, 20.0, 30.0, 40.0], 3).unwrap();
        let k = 2.0 / 4.0;

        assert!((out[0] - 10.0).abs() < f64::EPSILON);
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        assert!((out[1] - e1).abs() < f64::EPSILON);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        assert!((out[2] - e2).abs() < f64::EPSILON);
        let e3 = 40.0 * k + e2 * (1.0 - k);
        assert!((out[3] - e3).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_span_1_tracks_input() {
        let out = exponential_moving_average(&[10.0, 20.0, 30.0], 1).unwrap();
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_prices() {
        let out = exponential_moving_average(&[100.0; 5], 3).unwrap();
        for v in out {
            assert!((v - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_span_longer_than_series_is_allowed() {
        let out = exponential_moving_average(&[1.0, 2.0], 26).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn ema_empty_input() {
        let result = exponential_moving_average(&[], 3);
        assert!(matches!(result, Err(TradelensError::InsufficientData { .. })));
    }

    #[test]
    fn ema_zero_span() {
        let result = exponential_moving_average(&[1.0], 0);
        assert!(matches!(result, Err(TradelensError::InvalidParameter { .. })));
    }

    #[test]
    fn ema_smoothing_factor() {
        assert!((ema_alpha(10) - 2.0 / 11.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn ema_recurrence_holds(
            prices in prop::collection::vec(-1000.0f64..1000.0, 1..100),
            span in 1usize..50,
        ) {
            let out = exponential_moving_average(&prices, span).unwrap();
            let alpha = ema_alpha(span);
            prop_assert_eq!(out[0], prices[0]);
            for t in 1..prices.len() {
                prop_assert_eq!(out[t], prices[t] * alpha + out[t - 1] * (1.0 - alpha));
            }
        }
    }
}
