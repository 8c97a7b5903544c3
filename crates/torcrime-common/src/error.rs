//! Error types shared by torcrime crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while reading settings or wiring up process-wide services
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value {value:?} for {key}: expected {expected}")]
    InvalidSetting {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl CommonError {
    /// Build an error for a setting that failed to parse
    pub fn invalid_setting(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}
