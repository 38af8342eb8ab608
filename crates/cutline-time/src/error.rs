//! Error types for rational time arithmetic (thiserror-based).

use thiserror::Error;

/// Errors that can occur during time arithmetic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    /// A rescale was requested to or from a rate of zero.
    #[error("Invalid rate: {rate} (rates must be non-zero)")]
    InvalidRate { rate: f64 },
}

/// Convenience Result type for time operations.
pub type TimeResult<T> = Result<T, TimeError>;
