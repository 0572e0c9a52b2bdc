//! Business layer errors
//!
//! Every failure is classifiable through [`BusinessError::kind`]; nothing is
//! collapsed into a default value.

use ledgerline_core::CoreError;
use ledgerline_persistence::PersistenceError;
use std::fmt;
use thiserror::Error;

/// Error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    ValidationFailure,
    StorageFailure,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] PersistenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;

impl BusinessError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Create account not active error
    pub fn account_not_active(account_id: &str, status: &str) -> Self {
        Self::InvalidState(format!("account {} is {}", account_id, status))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BusinessError::NotFound { .. } => ErrorKind::NotFound,
            BusinessError::Conflict(_) => ErrorKind::Conflict,
            BusinessError::InvalidState(_) => ErrorKind::InvalidState,
            BusinessError::Validation(_) => ErrorKind::ValidationFailure,
            BusinessError::Storage(_) => ErrorKind::StorageFailure,
            BusinessError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<CoreError> for BusinessError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}
