//! Validation failures raised while constructing value objects.

use thiserror::Error;

/// Rejected input, with the offending field named.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: String },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
