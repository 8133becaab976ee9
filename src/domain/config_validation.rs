//! Configuration validation.
//!
//! Every INI value is checked before a config struct is built from it.
//! Absent keys fall back to their defaults and are not errors; present
//! keys must parse and lie in range.

use crate::domain::error::TradelensError;
use crate::domain::risk::Holding;
use crate::domain::strategy::StrategyKind;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    for key in [
        "sma_window",
        "rsi_period",
        "macd_fast",
        "macd_slow",
        "macd_signal",
        "atr_period",
    ] {
        positive_int(config, "indicators", key)?;
    }
    ordered_windows(config, "indicators", "macd_fast", 12, "macd_slow", 26)?;

    positive_int(config, "signals", "ma_short")?;
    positive_int(config, "signals", "ma_long")?;
    ordered_windows(config, "signals", "ma_short", 20, "ma_long", 50)?;
    validate_rsi_thresholds(config)
}

pub fn validate_sizing_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    positive_int(config, "sizing", "atr_period")?;
    positive_number(config, "sizing", "atr_multiplier")?;
    positive_number(config, "sizing", "account_size")?;
    let risk = number(config, "sizing", "risk_per_trade")?;
    if risk.is_some_and(|r| !(r > 0.0 && r <= 1.0)) {
        return Err(invalid(
            "sizing",
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    positive_number(config, "backtest", "initial_capital")?;
    let rate = number(config, "backtest", "commission_rate")?;
    if rate.is_some_and(|r| !(0.0..1.0).contains(&r)) {
        return Err(invalid(
            "backtest",
            "commission_rate",
            "commission_rate must be in [0, 1)",
        ));
    }
    positive_number(config, "backtest", "annualization_factor")?;
    boolean(config, "backtest", "fractional_shares")?;
    positive_int(config, "backtest", "fast_window")?;
    positive_int(config, "backtest", "slow_window")?;

    let kind = match config.get_string("backtest", "strategy") {
        Some(name) => Some(
            name.parse::<StrategyKind>()
                .map_err(|e| invalid("backtest", "strategy", &e.to_string()))?,
        ),
        None => None,
    };
    // price_crosses_ma only reads fast_window
    if kind != Some(StrategyKind::PriceCrossesMa) {
        ordered_windows(config, "backtest", "fast_window", 20, "slow_window", 50)?;
    }
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let pct = number(config, "risk", "var_percentile")?;
    if pct.is_some_and(|p| !(p > 0.0 && p < 100.0)) {
        return Err(invalid(
            "risk",
            "var_percentile",
            "var_percentile must be between 0 and 100",
        ));
    }
    positive_number(config, "risk", "annualization_factor")?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let dir = config.get_string("data", "data_dir");
    if dir.is_some_and(|d| d.trim().is_empty()) {
        return Err(TradelensError::ConfigMissing {
            section: "data".to_string(),
            key: "data_dir".to_string(),
        });
    }
    if let Some(tf) = config.get_string("data", "timeframe") {
        tf.parse::<Timeframe>()
            .map_err(|e| invalid("data", "timeframe", &e.to_string()))?;
    }
    for entry in config.get_list("data", "sectors") {
        parse_sector(&entry)?;
    }
    Ok(())
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    for entry in config.get_list("portfolio", "holdings") {
        parse_holding(&entry)?;
    }
    Ok(())
}

/// Runs every section check in file order.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    validate_data_config(config)?;
    validate_analysis_config(config)?;
    validate_sizing_config(config)?;
    validate_backtest_config(config)?;
    validate_risk_config(config)?;
    validate_portfolio_config(config)?;
    Ok(())
}

/// Parses a `Name=SYMBOL` sector entry.
pub fn parse_sector(entry: &str) -> Result<(String, String), TradelensError> {
    match entry.split_once('=') {
        Some((name, symbol)) if !name.trim().is_empty() && !symbol.trim().is_empty() => {
            Ok((name.trim().to_string(), symbol.trim().to_uppercase()))
        }
        _ => Err(invalid(
            "data",
            "sectors",
            &format!("'{entry}' is not of the form Name=SYMBOL"),
        )),
    }
}

/// Parses a `SYMBOL:shares:avg_price` holding entry.
pub fn parse_holding(entry: &str) -> Result<Holding, TradelensError> {
    let bad = |reason: &str| invalid("portfolio", "holdings", &format!("'{entry}': {reason}"));

    let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
    let [symbol, shares, avg_price] = parts.as_slice() else {
        return Err(bad("expected SYMBOL:shares:avg_price"));
    };
    if symbol.is_empty() {
        return Err(bad("empty symbol"));
    }
    let shares: f64 = shares.parse().map_err(|_| bad("shares is not a number"))?;
    let avg_price: f64 = avg_price
        .parse()
        .map_err(|_| bad("avg_price is not a number"))?;
    if !(shares > 0.0) {
        return Err(bad("shares must be positive"));
    }
    if !(avg_price > 0.0) {
        return Err(bad("avg_price must be positive"));
    }

    Ok(Holding {
        symbol: symbol.to_uppercase(),
        shares,
        avg_price,
    })
}

fn validate_rsi_thresholds(config: &dyn ConfigPort) -> Result<(), TradelensError> {
    let oversold = number(config, "signals", "rsi_oversold")?.unwrap_or(30.0);
    let overbought = number(config, "signals", "rsi_overbought")?.unwrap_or(70.0);
    for (key, value) in [("rsi_oversold", oversold), ("rsi_overbought", overbought)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("signals", key, "RSI thresholds must be within 0..=100"));
        }
    }
    if oversold >= overbought {
        return Err(invalid(
            "signals",
            "rsi_oversold",
            "rsi_oversold must be below rsi_overbought",
        ));
    }
    Ok(())
}

fn ordered_windows(
    config: &dyn ConfigPort,
    section: &str,
    fast_key: &str,
    fast_default: i64,
    slow_key: &str,
    slow_default: i64,
) -> Result<(), TradelensError> {
    let fast = config.get_int(section, fast_key, fast_default);
    let slow = config.get_int(section, slow_key, slow_default);
    if fast >= slow {
        return Err(invalid(
            section,
            fast_key,
            &format!("{fast_key} must be smaller than {slow_key}"),
        ));
    }
    Ok(())
}

fn positive_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TradelensError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => Ok(()),
        Ok(_) => Err(invalid(section, key, &format!("{key} must be positive"))),
        Err(_) => Err(invalid(section, key, &format!("{key} must be an integer"))),
    }
}

fn positive_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), TradelensError> {
    match number(config, section, key)? {
        Some(v) if !(v > 0.0) => Err(invalid(section, key, &format!("{key} must be positive"))),
        _ => Ok(()),
    }
}

fn number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, TradelensError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(invalid(section, key, &format!("{key} must be a number"))),
    }
}

fn boolean(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TradelensError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "false" | "no" | "off" | "0" => Ok(()),
        _ => Err(invalid(section, key, &format!("{key} must be a boolean"))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TradelensError {
    TradelensError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
