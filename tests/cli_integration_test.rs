//! CLI-layer tests: config builders over INI text, config files on disk,
//! and the CSV-backed pipelines the subcommands run.

mod common;

use common::*;
use std::io::Write;
use tradelens::adapters::csv_adapter::CsvAdapter;
use tradelens::adapters::file_config_adapter::FileConfigAdapter;
use tradelens::adapters::json_report_adapter::JsonReportAdapter;
use tradelens::cli;
use tradelens::domain::config::AnalysisConfig;
use tradelens::domain::error::TradelensError;
use tradelens::domain::strategy::StrategyKind;
use tradelens::domain::timeframe::Timeframe;
use tradelens::ports::data_port::MarketDataPort;
use tradelens::ports::report_port::{Report, ReportPort};

fn ini(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

mod builders {
    use super::*;

    #[test]
    fn analysis_defaults_from_empty_config() {
        let config = cli::build_analysis_config(&ini("")).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn analysis_custom_values() {
        let config = cli::build_analysis_config(&ini(
            "[indicators]\nsma_window = 10\nmacd_fast = 8\nmacd_slow = 21\n\
             [signals]\nma_short = 5\nma_long = 30\nrsi_oversold = 20\n",
        ))
        .unwrap();
        assert_eq!(config.sma_window, 10);
        assert_eq!((config.macd_fast, config.macd_slow, config.macd_signal), (8, 21, 9));
        assert_eq!((config.ma_short, config.ma_long), (5, 30));
        assert_eq!(config.rsi_oversold, 20.0);
        assert_eq!(config.rsi_overbought, 70.0);
    }

    #[test]
    fn analysis_invalid_window_rejected() {
        let err = cli::build_analysis_config(&ini("[indicators]\natr_period = -3\n")).unwrap_err();
        assert!(matches!(err, TradelensError::ConfigInvalid { key, .. } if key == "atr_period"));
    }

    #[test]
    fn backtest_config_values() {
        let config = cli::build_backtest_config(&ini(
            "[backtest]\ninitial_capital = 25000\ncommission_rate = 0.001\n\
             fractional_shares = true\nfast_window = 10\nslow_window = 40\n",
        ))
        .unwrap();
        assert_eq!(config.initial_capital, 25_000.0);
        assert_eq!(config.execution.commission_rate, 0.001);
        assert!(config.execution.fractional_shares);
        assert_eq!((config.fast_window, config.slow_window), (10, 40));
        assert_eq!(config.annualization_factor, 252.0);
    }

    #[test]
    fn backtest_defaults() {
        let config = cli::build_backtest_config(&ini("")).unwrap();
        assert_eq!(config.initial_capital, 10_000.0);
        assert_eq!(config.execution.commission_rate, 0.002);
        assert!(!config.execution.fractional_shares);
    }

    #[test]
    fn strategy_kind_from_config() {
        assert_eq!(cli::build_strategy_kind(&ini("")).unwrap(), StrategyKind::GoldenCross);
        assert_eq!(
            cli::build_strategy_kind(&ini("[backtest]\nstrategy = macd_crossover\n")).unwrap(),
            StrategyKind::MacdCrossover
        );
        let err = cli::build_strategy_kind(&ini("[backtest]\nstrategy = turtle\n")).unwrap_err();
        assert!(matches!(err, TradelensError::ConfigInvalid { key, .. } if key == "strategy"));
    }

    #[test]
    fn price_crosses_ma_ignores_slow_window() {
        let config = ini("[backtest]\nstrategy = price_crosses_ma\nfast_window = 50\nslow_window = 20\n");
        let backtest = cli::build_backtest_config(&config).unwrap();
        assert_eq!((backtest.fast_window, backtest.slow_window), (50, 20));
        assert_eq!(cli::build_strategy_kind(&config).unwrap(), StrategyKind::PriceCrossesMa);

        let err = cli::build_backtest_config(&ini("[backtest]\nfast_window = 50\nslow_window = 20\n"))
            .unwrap_err();
        assert!(matches!(err, TradelensError::ConfigInvalid { key, .. } if key == "fast_window"));
    }

    #[test]
    fn sizing_and_risk_values() {
        let config = ini(
            "[sizing]\natr_multiplier = 3\naccount_size = 20000\nrisk_per_trade = 0.02\n\
             [risk]\nvar_percentile = 1\n",
        );
        let sizing = cli::build_sizing_config(&config).unwrap();
        assert_eq!(sizing.atr_period, 14);
        assert_eq!(sizing.atr_multiplier, 3.0);
        assert_eq!(sizing.account_size, 20_000.0);
        assert_eq!(sizing.risk_per_trade, 0.02);

        let risk = cli::build_risk_config(&config).unwrap();
        assert_eq!(risk.var_percentile, 1.0);
        assert_eq!(risk.annualization_factor, 252.0);
    }

    #[test]
    fn data_config_lists() {
        let data = cli::build_data_config(&ini(
            "[data]\ndata_dir = /srv/quotes\ntimeframe = 1y\nsymbols = aapl, msft,,spy\n\
             sectors = Technology=XLK, Energy = xle\n",
        ))
        .unwrap();
        assert_eq!(data.data_dir, "/srv/quotes");
        assert_eq!(data.timeframe, "1y");
        assert_eq!(data.symbols, vec!["AAPL", "MSFT", "SPY"]);
        assert_eq!(
            data.sectors,
            vec![
                ("Technology".to_string(), "XLK".to_string()),
                ("Energy".to_string(), "XLE".to_string()),
            ]
        );
    }

    #[test]
    fn portfolio_holdings() {
        let portfolio =
            cli::build_portfolio_config(&ini("[portfolio]\nholdings = AAPL:10:150, msft:2.5:300\n"))
                .unwrap();
        assert_eq!(portfolio.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(portfolio.holdings[1].shares, 2.5);

        assert!(cli::build_portfolio_config(&ini("[portfolio]\nholdings = AAPL\n")).is_err());
    }
}

mod config_files {
    use super::*;

    #[test]
    fn load_from_disk() {
        let file = write_temp_ini("[data]\ntimeframe = 3mo\nsymbols = SPY\n");
        let config = cli::load_config(Some(file.path())).unwrap();
        let data = cli::build_data_config(&config).unwrap();
        assert_eq!(data.timeframe, "3mo");
        assert_eq!(data.symbols, vec!["SPY"]);
    }

    #[test]
    fn no_path_means_defaults() {
        let config = cli::load_config(None).unwrap();
        let data = cli::build_data_config(&config).unwrap();
        assert_eq!(data.data_dir, "data");
        assert_eq!(data.timeframe, "6mo");
    }
}

mod csv_pipeline {
    use super::*;

    #[test]
    fn analyze_and_backtest_from_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "AAA", &wave(120));
        write_csv(dir.path(), "BBB", &rising(120));
        let port = CsvAdapter::new(dir.path().to_path_buf());

        assert_eq!(port.list_symbols().unwrap(), vec!["AAA", "BBB"]);

        let symbols = vec!["AAA".to_string(), "BBB".to_string(), "ZZZ".to_string()];
        let analyses = cli::analyze_symbols(
            &port,
            &symbols,
            Timeframe::Max,
            &AnalysisConfig::default(),
            None,
        );
        assert_eq!(analyses.len(), 2);
        assert_eq!(analyses[0].report.sma.len(), 120);

        let config = cli::build_backtest_config(&ini("")).unwrap();
        let strategy = StrategyKind::GoldenCross.build(config.fast_window, config.slow_window);
        let results = cli::backtest_symbols(&port, &symbols, Timeframe::Max, &strategy, &config);
        assert_eq!(results.len(), 2);
        assert!(results[1].final_equity > config.initial_capital);
    }

    #[test]
    fn timeframe_trims_history() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "AAA", &rising(120));
        let port = CsvAdapter::new(dir.path().to_path_buf());

        // bars run 2024-01-01 through 2024-04-29
        let series = port.fetch_series("AAA", Timeframe::Months(1)).unwrap();
        assert_eq!(series.bars()[0].date, date(2024, 3, 29));
        assert_eq!(series.len(), 32);
    }

    #[test]
    fn zero_close_file_is_skipped_by_risk() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "AAA", &wave(60));
        std::fs::write(
            dir.path().join("BAD.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-01,10,11,9,10,1\n\
             2024-01-02,1,1,1,0,1\n\
             2024-01-03,5,6,4,5,1\n\
             2024-01-04,6,7,5,6,1\n",
        )
        .unwrap();
        let port = CsvAdapter::new(dir.path().to_path_buf());

        assert!(matches!(
            port.fetch_series("BAD", Timeframe::Max),
            Err(TradelensError::Data { .. })
        ));

        let report = cli::assess_portfolio(
            &port,
            &["AAA".to_string(), "BAD".to_string()],
            Timeframe::Max,
            &cli::build_risk_config(&ini("")).unwrap(),
            &Default::default(),
        )
        .unwrap();
        assert_eq!(report.symbols, vec!["AAA"]);
        assert_eq!(report.metrics.sample_size, 59);
        assert!(report.metrics.annualized_volatility.is_finite());
        assert!(report.metrics.value_at_risk_5pct.is_finite());
    }

    #[test]
    fn report_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "AAA", &wave(80));
        let port = CsvAdapter::new(dir.path().to_path_buf());
        let analyses = cli::analyze_symbols(
            &port,
            &["AAA".to_string()],
            Timeframe::Max,
            &AnalysisConfig::default(),
            Some(&Default::default()),
        );

        let out = dir.path().join("reports").join("analysis.json");
        JsonReportAdapter::default()
            .write(&Report::Analysis(&analyses), Some(&out))
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["kind"], "analysis");
        assert_eq!(value["data"][0]["symbol"], "AAA");
        assert!(value["data"][0]["sizing"]["position_size"].as_f64().unwrap() > 0.0);
    }
}
