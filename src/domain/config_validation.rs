//! Configuration validation.
//!
//! Every key is optional and falls back to its default; present keys are
//! validated before a backtest runs so a typo fails up front instead of
//! producing a silently wrong report.

use crate::domain::backtest::BacktestConfig;
use crate::domain::drawdown;
use crate::domain::error::StancetraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StancetraderError> {
    validate_slippage(config)?;
    validate_dd_depth(config)?;
    validate_dd_cutoff(config)?;
    Ok(())
}

/// Validate then assemble a [`BacktestConfig`] from the `[backtest]` section.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StancetraderError> {
    validate_backtest_config(config)?;
    Ok(BacktestConfig {
        slippage: config.get_double("backtest", "slippage", 0.0),
        long_only: config.get_bool("backtest", "long_only", false),
        dd_depth: config.get_int("backtest", "dd_depth", drawdown::DEFAULT_DEPTH as i64) as usize,
        dd_cutoff_pct: config.get_double("backtest", "dd_cutoff_pct", 0.0),
    })
}

/// Strategy spec string from the `[strategy]` section, if configured.
/// Syntax errors surface later, when the spec is parsed.
pub fn configured_spec(config: &dyn ConfigPort) -> Option<String> {
    config
        .get_string("strategy", "spec")
        .filter(|s| !s.trim().is_empty())
}

fn validate_slippage(config: &dyn ConfigPort) -> Result<(), StancetraderError> {
    let value = config.get_double("backtest", "slippage", 0.0);
    if value < 0.0 || !value.is_finite() {
        return Err(StancetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "slippage".to_string(),
            reason: "slippage must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_dd_depth(config: &dyn ConfigPort) -> Result<(), StancetraderError> {
    let value = config.get_int("backtest", "dd_depth", drawdown::DEFAULT_DEPTH as i64);
    if value < 1 {
        return Err(StancetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "dd_depth".to_string(),
            reason: "dd_depth must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_dd_cutoff(config: &dyn ConfigPort) -> Result<(), StancetraderError> {
    let value = config.get_double("backtest", "dd_cutoff_pct", 0.0);
    if !(0.0..=100.0).contains(&value) {
        return Err(StancetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "dd_cutoff_pct".to_string(),
            reason: "dd_cutoff_pct must be between 0 and 100".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
slippage = 0.001
long_only = true
dd_depth = 3
dd_cutoff_pct = 5.0
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = make_config("[backtest]\n");
        let built = build_backtest_config(&config).unwrap();
        assert_eq!(built, BacktestConfig::default());
    }

    #[test]
    fn build_reads_all_keys() {
        let config = make_config(
            "[backtest]\nslippage = 0.002\nlong_only = yes\ndd_depth = 2\ndd_cutoff_pct = 10\n",
        );
        let built = build_backtest_config(&config).unwrap();
        assert_eq!(built.slippage, 0.002);
        assert!(built.long_only);
        assert_eq!(built.dd_depth, 2);
        assert_eq!(built.dd_cutoff_pct, 10.0);
    }

    #[test]
    fn slippage_negative_fails() {
        let config = make_config("[backtest]\nslippage = -0.01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, StancetraderError::ConfigInvalid { key, .. } if key == "slippage"));
    }

    #[test]
    fn dd_depth_zero_fails() {
        let config = make_config("[backtest]\ndd_depth = 0\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, StancetraderError::ConfigInvalid { key, .. } if key == "dd_depth"));
    }

    #[test]
    fn dd_cutoff_out_of_range_fails() {
        let config = make_config("[backtest]\ndd_cutoff_pct = 150\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, StancetraderError::ConfigInvalid { key, .. } if key == "dd_cutoff_pct")
        );

        let config = make_config("[backtest]\ndd_cutoff_pct = -1\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, StancetraderError::ConfigInvalid { key, .. } if key == "dd_cutoff_pct")
        );
    }

    #[test]
    fn configured_spec_ignores_blank() {
        let config = make_config("[strategy]\nspec = ma:5,20\n");
        assert_eq!(configured_spec(&config), Some("ma:5,20".to_string()));

        let config = make_config("[strategy]\nspec =\n");
        assert_eq!(configured_spec(&config), None);

        let config = make_config("[backtest]\n");
        assert_eq!(configured_spec(&config), None);
    }
}
