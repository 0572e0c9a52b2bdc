//! # Error Module
//!
//! Domain errors cho Ledgerline sử dụng thiserror.

use thiserror::Error;

/// Core domain errors.
///
/// Các lỗi validation thuần túy, không liên quan đến infrastructure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid ID format: {0}")]
    InvalidIdFormat(String),
}

/// Result type alias với CoreError
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidAmount("amount must be positive: 0".to_string());
        assert_eq!(err.to_string(), "Invalid amount: amount must be positive: 0");

        let err = CoreError::InvalidDuration("session ttl 5s overflows".to_string());
        assert_eq!(err.to_string(), "Invalid duration: session ttl 5s overflows");
    }
}
