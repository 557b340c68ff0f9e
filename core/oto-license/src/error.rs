//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Code does not match the expected grammar.
    #[error("invalid license code format: {0}")]
    InvalidCodeFormat(String),

    /// Embedded signature does not match the embedded date.
    #[error("master license signature invalid")]
    InvalidSignature,

    /// Date component is neither `UNLIMITED` nor a valid `YYYYMMDD` date.
    #[error("invalid date component: {0}")]
    InvalidDate(String),

    /// License has expired.
    #[error("license expired on {0}")]
    Expired(String),

    /// Duration input is not an integer within `1..=max`.
    #[error("invalid duration {input:?}: expected a whole number of days between 1 and {max}")]
    InvalidDuration {
        /// The rejected input.
        input: String,
        /// Inclusive upper bound.
        max: u32,
    },
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
