//! Data Validation
//!
//! Required-field checks and nominal range checks for soil test submissions.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
