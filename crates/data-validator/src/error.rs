//! Validation Error Types

use thiserror::Error;

/// Errors during data validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of nominal range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value is not a finite number
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Required text field left empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
