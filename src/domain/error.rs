//! Domain error types.
//!
//! Structural and configuration problems are errors raised at construction
//! time. Numerical degeneracies (zero variance, unrecovered drawdowns, open
//! trades) are sentinel values in the output, never errors.

use chrono::NaiveDate;

/// Top-level error type for stancetrader.
#[derive(Debug, thiserror::Error)]
pub enum StancetraderError {
    #[error("price series has no usable observations")]
    EmptyInput,

    #[error("insufficient history: series spans {days} day(s), need at least 1")]
    InsufficientHistory { days: i64 },

    #[error("duplicate date {date} in price series")]
    DuplicateDate { date: NaiveDate },

    #[error("stance series has {stances} values for {bars} bars")]
    StanceMismatch { bars: usize, stances: usize },

    #[error("{weights} weight(s) supplied for {strategies} strategies")]
    WeightMismatch { strategies: usize, weights: usize },

    #[error("portfolio weights must be non-negative with a positive sum")]
    InvalidWeights,

    #[error("portfolio constructed with an empty strategy list")]
    NoStrategies,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid strategy spec '{spec}': {reason}")]
    StrategySpec { spec: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StancetraderError> for std::process::ExitCode {
    fn from(err: &StancetraderError) -> Self {
        let code: u8 = match err {
            StancetraderError::Io(_) => 1,
            StancetraderError::ConfigParse { .. }
            | StancetraderError::ConfigInvalid { .. }
            | StancetraderError::StrategySpec { .. } => 2,
            StancetraderError::Data { .. } => 3,
            StancetraderError::EmptyInput
            | StancetraderError::InsufficientHistory { .. }
            | StancetraderError::DuplicateDate { .. }
            | StancetraderError::StanceMismatch { .. } => 4,
            StancetraderError::WeightMismatch { .. }
            | StancetraderError::InvalidWeights
            | StancetraderError::NoStrategies => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = StancetraderError::WeightMismatch {
            strategies: 3,
            weights: 2,
        };
        assert_eq!(err.to_string(), "2 weight(s) supplied for 3 strategies");

        let err = StancetraderError::InsufficientHistory { days: 0 };
        assert_eq!(
            err.to_string(),
            "insufficient history: series spans 0 day(s), need at least 1"
        );
    }

    // ExitCode has no PartialEq; compare debug renderings.
    fn exit_code_of(err: &StancetraderError) -> String {
        format!("{:?}", std::process::ExitCode::from(err))
    }

    #[test]
    fn exit_codes_by_class() {
        let input = StancetraderError::EmptyInput;
        assert_eq!(
            exit_code_of(&input),
            format!("{:?}", std::process::ExitCode::from(4))
        );

        let portfolio = StancetraderError::NoStrategies;
        assert_eq!(
            exit_code_of(&portfolio),
            format!("{:?}", std::process::ExitCode::from(5))
        );

        let config = StancetraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "slippage".into(),
            reason: "must be non-negative".into(),
        };
        assert_eq!(
            exit_code_of(&config),
            format!("{:?}", std::process::ExitCode::from(2))
        );
    }
}
