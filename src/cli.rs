//! CLI definition and dispatch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analysis::{analyze, SymbolAnalysis};
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::config::{
    AnalysisConfig, DataConfig, PortfolioConfig, RiskConfig, SizingConfig,
};
use crate::domain::config_validation::{
    parse_holding, parse_sector, validate_all, validate_analysis_config,
    validate_backtest_config, validate_data_config, validate_portfolio_config,
    validate_risk_config, validate_sizing_config,
};
use crate::domain::error::TradelensError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::overview::{heatmap_row, sector_row, MarketOverview};
use crate::domain::risk::{portfolio_snapshot, HoldingReturns, PortfolioRiskAssessor, RiskReport};
use crate::domain::sizing::PositionSizer;
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::{Report, ReportPort};

#[derive(Parser, Debug)]
#[command(
    name = "tradelens",
    version,
    about = "Technical analysis, position sizing, backtesting and portfolio risk over daily bars"
)]
pub struct Cli {
    /// INI configuration file; built-in defaults when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Write the JSON result here instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Indicators, signals and a sizing recommendation per symbol
    Analyze {
        /// Symbols to analyze; `[data] symbols` when empty
        #[arg(value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
        /// Skip the ATR sizing recommendation
        #[arg(long)]
        no_sizing: bool,
    },
    /// Replay a crossover strategy over each symbol
    Backtest {
        #[arg(value_delimiter = ',')]
        symbols: Vec<String>,
        /// golden_cross, ema_crossover, price_crosses_ma or macd_crossover
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        #[arg(long)]
        fast: Option<usize>,
        #[arg(long)]
        slow: Option<usize>,
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },
    /// Risk-based position size from an ATR value or a symbol's latest ATR
    Size {
        #[arg(long, required_unless_present = "symbol", conflicts_with = "symbol")]
        atr: Option<f64>,
        #[arg(long)]
        symbol: Option<String>,
        /// Account equity; `[sizing] account_size` when absent
        #[arg(long)]
        equity: Option<f64>,
        /// Fraction of equity at risk; `[sizing] risk_per_trade` when absent
        #[arg(long)]
        risk: Option<f64>,
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },
    /// Pooled value-at-risk and volatility, plus holdings valuation
    Risk {
        #[arg(value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },
    /// Return/volatility heatmap and sector performance
    Overview {
        #[arg(value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },
    /// Check every configuration value
    Validate,
    /// List symbols available in the data directory
    ListSymbols,
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(&e)
        }
    }
}

fn execute(cli: &Cli) -> Result<(), TradelensError> {
    let config = load_config(cli.config.as_deref())?;
    let output = cli.output.as_deref();

    match &cli.command {
        Command::Validate => {
            validate_all(&config)?;
            info!("configuration is valid");
            Ok(())
        }
        Command::ListSymbols => {
            let data = build_data_config(&config)?;
            for symbol in CsvAdapter::new(PathBuf::from(&data.data_dir)).list_symbols()? {
                println!("{symbol}");
            }
            Ok(())
        }
        Command::Analyze {
            symbols,
            timeframe,
            no_sizing,
        } => run_analyze(&config, symbols, *timeframe, *no_sizing, output),
        Command::Backtest {
            symbols,
            strategy,
            fast,
            slow,
            timeframe,
        } => run_backtest_command(&config, symbols, *strategy, *fast, *slow, *timeframe, output),
        Command::Size {
            atr,
            symbol,
            equity,
            risk,
            timeframe,
        } => run_size(&config, *atr, symbol.as_deref(), *equity, *risk, *timeframe, output),
        Command::Risk { symbols, timeframe } => run_risk(&config, symbols, *timeframe, output),
        Command::Overview { symbols, timeframe } => {
            run_overview(&config, symbols, *timeframe, output)
        }
    }
}

/// Reads the INI file, or an empty configuration when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TradelensError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path).map_err(|e| TradelensError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        }
        None => FileConfigAdapter::from_string("").map_err(|reason| TradelensError::ConfigParse {
            file: "<defaults>".to_string(),
            reason,
        }),
    }
}

fn run_analyze(
    config: &dyn ConfigPort,
    symbols: &[String],
    timeframe: Option<Timeframe>,
    no_sizing: bool,
    output: Option<&Path>,
) -> Result<(), TradelensError> {
    let data = build_data_config(config)?;
    let analysis = build_analysis_config(config)?;
    let sizing = if no_sizing {
        None
    } else {
        Some(build_sizing_config(config)?)
    };
    let symbols = resolve_symbols(symbols, &data)?;
    let timeframe = resolve_timeframe(timeframe, &data)?;
    let port = CsvAdapter::new(PathBuf::from(&data.data_dir));

    info!(symbols = symbols.len(), %timeframe, "analyzing");
    let results = analyze_symbols(&port, &symbols, timeframe, &analysis, sizing.as_ref());
    if results.is_empty() {
        return Err(TradelensError::data("no symbol could be analyzed"));
    }

    JsonReportAdapter::default().write(&Report::Analysis(&results), output)
}

/// Analyzes each symbol in parallel. Symbols that cannot be fetched or are
/// too short are skipped with a warning; output keeps the input order.
pub fn analyze_symbols<D: MarketDataPort + Sync>(
    port: &D,
    symbols: &[String],
    timeframe: Timeframe,
    analysis: &AnalysisConfig,
    sizing: Option<&SizingConfig>,
) -> Vec<SymbolAnalysis> {
    symbols
        .par_iter()
        .filter_map(|symbol| {
            let series = fetch_or_warn(port, symbol, timeframe)?;
            let report = match analyze(&series, analysis) {
                Ok(report) => report,
                Err(e) => {
                    warn!(%symbol, error = %e, "skipping symbol");
                    return None;
                }
            };
            let sizing = sizing.and_then(|cfg| {
                PositionSizer::new(cfg)
                    .recommend(&series, cfg.account_size, cfg.risk_per_trade)
                    .map_err(|e| warn!(%symbol, error = %e, "no sizing recommendation"))
                    .ok()
            });
            Some(SymbolAnalysis { report, sizing })
        })
        .collect()
}

fn run_backtest_command(
    config: &dyn ConfigPort,
    symbols: &[String],
    strategy: Option<StrategyKind>,
    fast: Option<usize>,
    slow: Option<usize>,
    timeframe: Option<Timeframe>,
    output: Option<&Path>,
) -> Result<(), TradelensError> {
    let data = build_data_config(config)?;
    let mut bt_config = build_backtest_config(config)?;
    if let Some(fast) = fast {
        bt_config.fast_window = fast;
    }
    if let Some(slow) = slow {
        bt_config.slow_window = slow;
    }
    let kind = match strategy {
        Some(kind) => kind,
        None => build_strategy_kind(config)?,
    };
    if kind != StrategyKind::PriceCrossesMa && bt_config.fast_window >= bt_config.slow_window {
        return Err(TradelensError::invalid(format!(
            "fast window {} must be smaller than slow window {}",
            bt_config.fast_window, bt_config.slow_window
        )));
    }
    let strategy = kind.build(bt_config.fast_window, bt_config.slow_window);
    let symbols = resolve_symbols(symbols, &data)?;
    let timeframe = resolve_timeframe(timeframe, &data)?;
    let port = CsvAdapter::new(PathBuf::from(&data.data_dir));

    info!(strategy = %strategy.name, symbols = symbols.len(), %timeframe, "backtesting");
    let results = backtest_symbols(&port, &symbols, timeframe, &strategy, &bt_config);
    if results.is_empty() {
        return Err(TradelensError::data("no symbol could be backtested"));
    }

    JsonReportAdapter::default().write(&Report::Backtest(&results), output)
}

/// Backtests each symbol in parallel, skipping failures with a warning.
pub fn backtest_symbols<D: MarketDataPort + Sync>(
    port: &D,
    symbols: &[String],
    timeframe: Timeframe,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Vec<BacktestResult> {
    symbols
        .par_iter()
        .filter_map(|symbol| {
            let series = fetch_or_warn(port, symbol, timeframe)?;
            match run_backtest(&series, strategy, config) {
                Ok(result) => {
                    info!(
                        %symbol,
                        final_equity = result.final_equity,
                        total_return_pct = result.total_return_pct,
                        trades = result.trades.len(),
                        "backtest complete"
                    );
                    Some(result)
                }
                Err(e) => {
                    warn!(%symbol, error = %e, "skipping symbol");
                    None
                }
            }
        })
        .collect()
}

fn run_size(
    config: &dyn ConfigPort,
    atr: Option<f64>,
    symbol: Option<&str>,
    equity: Option<f64>,
    risk: Option<f64>,
    timeframe: Option<Timeframe>,
    output: Option<&Path>,
) -> Result<(), TradelensError> {
    let sizing = build_sizing_config(config)?;
    let sizer = PositionSizer::new(&sizing);
    let equity = equity.unwrap_or(sizing.account_size);
    let fraction = risk.unwrap_or(sizing.risk_per_trade);

    let recommendation = match (atr, symbol) {
        (Some(atr), _) => sizer.size(atr, equity, fraction)?,
        (None, Some(symbol)) => {
            let data = build_data_config(config)?;
            let timeframe = resolve_timeframe(timeframe, &data)?;
            let series = CsvAdapter::new(PathBuf::from(&data.data_dir))
                .fetch_series(&symbol.to_uppercase(), timeframe)?;
            sizer.recommend(&series, equity, fraction)?
        }
        (None, None) => {
            return Err(TradelensError::invalid("either --atr or --symbol is required"));
        }
    };

    debug!(
        position_size = recommendation.position_size,
        stop_loss_distance = recommendation.stop_loss_distance,
        "sizing"
    );
    JsonReportAdapter::default().write(&Report::Sizing(&recommendation), output)
}

fn run_risk(
    config: &dyn ConfigPort,
    symbols: &[String],
    timeframe: Option<Timeframe>,
    output: Option<&Path>,
) -> Result<(), TradelensError> {
    let data = build_data_config(config)?;
    let risk = build_risk_config(config)?;
    let portfolio = build_portfolio_config(config)?;
    let symbols = if !symbols.is_empty() {
        normalize_symbols(symbols)
    } else if !portfolio.holdings.is_empty() {
        portfolio.symbols()
    } else {
        resolve_symbols(&[], &data)?
    };
    let timeframe = resolve_timeframe(timeframe, &data)?;
    let port = CsvAdapter::new(PathBuf::from(&data.data_dir));

    let report = assess_portfolio(&port, &symbols, timeframe, &risk, &portfolio)?;
    info!(
        symbols = report.symbols.len(),
        var = report.metrics.value_at_risk_5pct,
        volatility = report.metrics.annualized_volatility,
        "risk assessed"
    );
    JsonReportAdapter::default().write(&Report::Risk(&report), output)
}

/// Pools returns across `symbols` and, when holdings are configured,
/// values them at their latest closes.
pub fn assess_portfolio<D: MarketDataPort + Sync>(
    port: &D,
    symbols: &[String],
    timeframe: Timeframe,
    risk: &RiskConfig,
    portfolio: &PortfolioConfig,
) -> Result<RiskReport, TradelensError> {
    let fetched = fetch_all(port, symbols, timeframe);
    let returns: Vec<HoldingReturns> = fetched.iter().map(HoldingReturns::from_series).collect();
    let metrics = PortfolioRiskAssessor::new(risk).assess(&returns)?;

    let snapshot = if portfolio.holdings.is_empty() {
        None
    } else {
        let mut latest_prices: HashMap<String, f64> = fetched
            .iter()
            .filter_map(|s| s.last().map(|bar| (s.symbol().to_string(), bar.close)))
            .collect();
        let missing: Vec<String> = portfolio
            .symbols()
            .into_iter()
            .filter(|s| !latest_prices.contains_key(s))
            .collect();
        for series in fetch_all(port, &missing, timeframe) {
            if let Some(bar) = series.last() {
                latest_prices.insert(series.symbol().to_string(), bar.close);
            }
        }
        Some(portfolio_snapshot(&portfolio.holdings, &latest_prices)?)
    };

    Ok(RiskReport {
        symbols: fetched.iter().map(|s| s.symbol().to_string()).collect(),
        metrics,
        snapshot,
    })
}

fn run_overview(
    config: &dyn ConfigPort,
    symbols: &[String],
    timeframe: Option<Timeframe>,
    output: Option<&Path>,
) -> Result<(), TradelensError> {
    let data = build_data_config(config)?;
    let symbols = if symbols.is_empty() {
        data.symbols.clone()
    } else {
        normalize_symbols(symbols)
    };
    let timeframe = resolve_timeframe(timeframe, &data)?;
    let port = CsvAdapter::new(PathBuf::from(&data.data_dir));

    let overview = market_overview(&port, &symbols, &data.sectors, timeframe);
    info!(
        heatmap = overview.heatmap.len(),
        sectors = overview.sectors.len(),
        "overview built"
    );
    JsonReportAdapter::default().write(&Report::Overview(&overview), output)
}

/// Heatmap rows for `symbols` and sector rows for `(sector, symbol)` pairs.
pub fn market_overview<D: MarketDataPort + Sync>(
    port: &D,
    symbols: &[String],
    sectors: &[(String, String)],
    timeframe: Timeframe,
) -> MarketOverview {
    let heatmap = symbols
        .par_iter()
        .filter_map(|symbol| {
            let series = fetch_or_warn(port, symbol, timeframe)?;
            heatmap_row(&series)
                .map_err(|e| warn!(%symbol, error = %e, "no heatmap row"))
                .ok()
        })
        .collect();
    let sectors = sectors
        .par_iter()
        .filter_map(|(sector, symbol)| {
            let series = fetch_or_warn(port, symbol, timeframe)?;
            sector_row(sector, &series)
                .map_err(|e| warn!(%sector, error = %e, "no sector row"))
                .ok()
        })
        .collect();
    MarketOverview { heatmap, sectors }
}

fn fetch_all<D: MarketDataPort + Sync>(
    port: &D,
    symbols: &[String],
    timeframe: Timeframe,
) -> Vec<TimeSeries> {
    symbols
        .par_iter()
        .filter_map(|symbol| fetch_or_warn(port, symbol, timeframe))
        .collect()
}

fn fetch_or_warn<D: MarketDataPort>(
    port: &D,
    symbol: &str,
    timeframe: Timeframe,
) -> Option<TimeSeries> {
    match port.fetch_series(symbol, timeframe) {
        Ok(series) => {
            debug!(%symbol, bars = series.len(), "fetched");
            Some(series)
        }
        Err(e) => {
            warn!(%symbol, error = %e, "skipping symbol");
            None
        }
    }
}

fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn resolve_symbols(args: &[String], data: &DataConfig) -> Result<Vec<String>, TradelensError> {
    let symbols = if args.is_empty() {
        data.symbols.clone()
    } else {
        normalize_symbols(args)
    };
    if symbols.is_empty() {
        return Err(TradelensError::ConfigMissing {
            section: "data".to_string(),
            key: "symbols".to_string(),
        });
    }
    Ok(symbols)
}

fn resolve_timeframe(
    arg: Option<Timeframe>,
    data: &DataConfig,
) -> Result<Timeframe, TradelensError> {
    match arg {
        Some(tf) => Ok(tf),
        None => data.timeframe.parse(),
    }
}

fn window(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    let fallback = i64::try_from(default).unwrap_or(i64::MAX);
    usize::try_from(config.get_int(section, key, fallback)).unwrap_or(default)
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, TradelensError> {
    validate_analysis_config(config)?;
    let d = AnalysisConfig::default();
    Ok(AnalysisConfig {
        sma_window: window(config, "indicators", "sma_window", d.sma_window),
        rsi_period: window(config, "indicators", "rsi_period", d.rsi_period),
        macd_fast: window(config, "indicators", "macd_fast", d.macd_fast),
        macd_slow: window(config, "indicators", "macd_slow", d.macd_slow),
        macd_signal: window(config, "indicators", "macd_signal", d.macd_signal),
        atr_period: window(config, "indicators", "atr_period", d.atr_period),
        ma_short: window(config, "signals", "ma_short", d.ma_short),
        ma_long: window(config, "signals", "ma_long", d.ma_long),
        rsi_oversold: config.get_double("signals", "rsi_oversold", d.rsi_oversold),
        rsi_overbought: config.get_double("signals", "rsi_overbought", d.rsi_overbought),
    })
}

pub fn build_sizing_config(config: &dyn ConfigPort) -> Result<SizingConfig, TradelensError> {
    validate_sizing_config(config)?;
    let d = SizingConfig::default();
    Ok(SizingConfig {
        atr_period: window(config, "sizing", "atr_period", d.atr_period),
        atr_multiplier: config.get_double("sizing", "atr_multiplier", d.atr_multiplier),
        account_size: config.get_double("sizing", "account_size", d.account_size),
        risk_per_trade: config.get_double("sizing", "risk_per_trade", d.risk_per_trade),
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradelensError> {
    validate_backtest_config(config)?;
    let d = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", d.initial_capital),
        execution: ExecutionConfig {
            commission_rate: config.get_double(
                "backtest",
                "commission_rate",
                d.execution.commission_rate,
            ),
            fractional_shares: config.get_bool(
                "backtest",
                "fractional_shares",
                d.execution.fractional_shares,
            ),
        },
        annualization_factor: config.get_double(
            "backtest",
            "annualization_factor",
            d.annualization_factor,
        ),
        fast_window: window(config, "backtest", "fast_window", d.fast_window),
        slow_window: window(config, "backtest", "slow_window", d.slow_window),
    })
}

/// `[backtest] strategy`, golden cross when unset.
pub fn build_strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, TradelensError> {
    match config.get_string("backtest", "strategy") {
        Some(name) => name.parse().map_err(|e: TradelensError| TradelensError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "strategy".to_string(),
            reason: e.to_string(),
        }),
        None => Ok(StrategyKind::GoldenCross),
    }
}

pub fn build_risk_config(config: &dyn ConfigPort) -> Result<RiskConfig, TradelensError> {
    validate_risk_config(config)?;
    let d = RiskConfig::default();
    Ok(RiskConfig {
        var_percentile: config.get_double("risk", "var_percentile", d.var_percentile),
        annualization_factor: config.get_double(
            "risk",
            "annualization_factor",
            d.annualization_factor,
        ),
    })
}

pub fn build_data_config(config: &dyn ConfigPort) -> Result<DataConfig, TradelensError> {
    validate_data_config(config)?;
    let d = DataConfig::default();
    let sectors = config
        .get_list("data", "sectors")
        .iter()
        .map(|entry| parse_sector(entry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DataConfig {
        data_dir: config.get_string("data", "data_dir").unwrap_or(d.data_dir),
        timeframe: config.get_string("data", "timeframe").unwrap_or(d.timeframe),
        symbols: normalize_symbols(&config.get_list("data", "symbols")),
        sectors,
    })
}

pub fn build_portfolio_config(config: &dyn ConfigPort) -> Result<PortfolioConfig, TradelensError> {
    validate_portfolio_config(config)?;
    let holdings = config
        .get_list("portfolio", "holdings")
        .iter()
        .map(|entry| parse_holding(entry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PortfolioConfig { holdings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tradelens",
            "backtest",
            "AAPL,msft",
            "--strategy",
            "ema",
            "--fast",
            "5",
            "--config",
            "tradelens.ini",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("tradelens.ini")));
        match cli.command {
            Command::Backtest {
                symbols,
                strategy,
                fast,
                slow,
                ..
            } => {
                assert_eq!(symbols, vec!["AAPL".to_string(), "msft".to_string()]);
                assert_eq!(strategy, Some(StrategyKind::EmaCrossover));
                assert_eq!(fast, Some(5));
                assert_eq!(slow, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_timeframe_argument() {
        let cli = Cli::try_parse_from(["tradelens", "analyze", "SPY", "-t", "ytd"]).unwrap();
        match cli.command {
            Command::Analyze { timeframe, .. } => assert_eq!(timeframe, Some(Timeframe::YearToDate)),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["tradelens", "analyze", "-t", "3w"]).is_err());
    }

    #[test]
    fn size_requires_atr_or_symbol() {
        assert!(Cli::try_parse_from(["tradelens", "size"]).is_err());
        assert!(Cli::try_parse_from(["tradelens", "size", "--atr", "2", "--symbol", "X"]).is_err());
        assert!(Cli::try_parse_from(["tradelens", "size", "--atr", "2"]).is_ok());
        assert!(Cli::try_parse_from(["tradelens", "size", "--symbol", "AAPL"]).is_ok());
    }

    #[test]
    fn symbols_normalized() {
        let symbols = normalize_symbols(&[" aapl ".into(), "".into(), "Msft".into()]);
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn missing_symbols_reported_against_config() {
        let err = resolve_symbols(&[], &DataConfig::default()).unwrap_err();
        assert!(matches!(err, TradelensError::ConfigMissing { key, .. } if key == "symbols"));
    }

    #[test]
    fn missing_config_file_is_parse_error() {
        let err = load_config(Some(Path::new("/nonexistent/tradelens.ini"))).unwrap_err();
        assert!(matches!(err, TradelensError::ConfigParse { .. }));
    }
}
