//! Domain error types.
//!
//! Numeric edge cases (warm-up, zero divisors) never surface here; they are
//! absorbed as undefined values. Only configuration problems and structurally
//! invalid input reach the caller.

use chrono::NaiveDateTime;

/// Top-level error type for signaldesk.
#[derive(Debug, thiserror::Error)]
pub enum SignaldeskError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("series {symbol} is not in ascending order at bar {index}")]
    UnorderedSeries { symbol: String, index: usize },

    #[error("series {symbol} has duplicate timestamp {timestamp}")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: NaiveDateTime,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignaldeskError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SignaldeskError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that retrying cannot fix.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SignaldeskError::ConfigParse { .. }
                | SignaldeskError::ConfigMissing { .. }
                | SignaldeskError::ConfigInvalid { .. }
        )
    }
}

impl From<&SignaldeskError> for std::process::ExitCode {
    fn from(err: &SignaldeskError) -> Self {
        let code: u8 = match err {
            SignaldeskError::Io(_) => 1,
            SignaldeskError::ConfigParse { .. }
            | SignaldeskError::ConfigMissing { .. }
            | SignaldeskError::ConfigInvalid { .. } => 2,
            SignaldeskError::UnorderedSeries { .. }
            | SignaldeskError::DuplicateTimestamp { .. }
            | SignaldeskError::Data { .. }
            | SignaldeskError::Csv(_) => 3,
            SignaldeskError::Report { .. } => 4,
            SignaldeskError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
