//! File-driven pipeline tests: INI config, CSV data, spec parsing.

mod common;

use common::*;
use stancetrader::adapters::csv_adapter::CsvAdapter;
use stancetrader::adapters::file_config_adapter::FileConfigAdapter;
use stancetrader::domain::backtest::{Backtest, BacktestConfig};
use stancetrader::domain::config_validation::{
    build_backtest_config, configured_spec, validate_backtest_config,
};
use stancetrader::domain::error::StancetraderError;
use stancetrader::domain::strategy::parse_spec;
use stancetrader::ports::data_port::DataPort;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_csv(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prices.csv");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn write_ini(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn config_file_to_backtest_config() {
    let file = write_ini(
        r#"
[backtest]
slippage = 0.001
long_only = true
dd_depth = 3
dd_cutoff_pct = 2.5

[strategy]
spec = higher:2
"#,
    );
    let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
    assert!(validate_backtest_config(&adapter).is_ok());

    let config = build_backtest_config(&adapter).unwrap();
    assert_eq!(config.slippage, 0.001);
    assert!(config.long_only);
    assert_eq!(config.dd_depth, 3);
    assert_eq!(config.dd_cutoff_pct, 2.5);

    assert_eq!(configured_spec(&adapter), Some("higher:2".to_string()));
}

#[test]
fn invalid_config_value_is_rejected() {
    let file = write_ini("[backtest]\nslippage = -1\n");
    let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
    let err = build_backtest_config(&adapter).unwrap_err();
    assert!(matches!(err, StancetraderError::ConfigInvalid { key, .. } if key == "slippage"));
}

#[test]
fn csv_file_to_summary_pipeline() {
    let (_dir, path) = write_csv(
        "date,last\n\
         2024-01-01,100.0\n\
         2024-01-02,110.0\n\
         2024-01-03,90.0\n\
         2024-01-04,95.0\n\
         2024-01-05,130.0\n",
    );

    let prices = CsvAdapter::new(path).fetch_prices(None, None).unwrap();
    let provider = parse_spec("higher:1").unwrap();
    let mut backtest = Backtest::new(prices, provider, BacktestConfig::default());

    let summary = backtest.summary().unwrap().clone();
    assert!(summary.years > 0.0);
    assert_eq!(summary.current_stance, 1.0); // 130 >= 95

    let trades = backtest.trades().unwrap();
    assert!(!trades.is_empty());
}

#[test]
fn config_spec_drives_the_provider() {
    let file = write_ini("[strategy]\nspec = ma:2,4:long-only\n");
    let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
    let spec = configured_spec(&adapter).unwrap();

    let provider = parse_spec(&spec).unwrap();
    let stances = provider.stances(&daily_prices(&[100.0, 90.0, 80.0, 70.0, 60.0, 50.0]));
    assert!(stances.iter().all(|&s| s >= 0.0));
}

#[test]
fn date_window_restricts_the_backtest() {
    let (_dir, path) = write_csv(
        "date,last\n\
         2024-01-01,100.0\n\
         2024-01-02,110.0\n\
         2024-01-03,90.0\n\
         2024-01-04,95.0\n\
         2024-01-05,130.0\n",
    );
    let adapter = CsvAdapter::new(path);

    let prices = adapter
        .fetch_prices(Some(date(2024, 1, 2)), Some(date(2024, 1, 4)))
        .unwrap();
    assert_eq!(prices.len(), 3);
    assert_eq!(prices.first_date(), date(2024, 1, 2));

    // A window with no bars at all is an input error.
    let err = adapter
        .fetch_prices(Some(date(2025, 1, 1)), None)
        .unwrap_err();
    assert!(matches!(err, StancetraderError::EmptyInput));
}

#[test]
fn malformed_spec_reports_the_offending_string() {
    let err = parse_spec("ma:20,5").unwrap_err();
    match err {
        StancetraderError::StrategySpec { spec, .. } => assert_eq!(spec, "ma:20,5"),
        other => panic!("unexpected error: {other}"),
    }
}
