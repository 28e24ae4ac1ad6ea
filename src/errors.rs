//! Error types for casetrack
//!
//! Each error type has a corresponding error code for programmatic handling.

use thiserror::Error;

/// Result type alias for casetrack operations
pub type Result<T> = std::result::Result<T, CaseError>;

/// Main error type for all casetrack operations
#[derive(Debug, Error)]
pub enum CaseError {
    /// A required field is missing or invalid; re-prompt the user
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Action attempted out of order (e.g. complete before save)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Case step pointer and step records disagree
    #[error("Step records out of sync: {0}")]
    Sync(String),

    /// Expected case, step record, category or evidence is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Case is absent from a listing that only holds active cases
    #[error("Case not listed as active: {0}")]
    Inactive(String),

    /// Network or backend failure, surfaced verbatim
    #[error("{0}")]
    Transport(String),

    /// The collaborator does not implement an optional operation
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Invalid JSON format
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error with context
    #[error("{context}: {message}")]
    Wrapped { context: String, message: String },
}

impl CaseError {
    /// Get the error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CaseError::Validation(_) => "VALIDATION",
            CaseError::Precondition(_) => "PRECONDITION",
            CaseError::Sync(_) => "SYNC",
            CaseError::NotFound(_) => "NOT_FOUND",
            CaseError::Inactive(_) => "INACTIVE",
            CaseError::Transport(_) => "TRANSPORT",
            CaseError::NotSupported(_) => "NOT_SUPPORTED",
            CaseError::InvalidJson(_) => "INVALID_JSON",
            CaseError::ConfigError(_) => "CONFIG_ERROR",
            CaseError::FileNotFound(_) => "FILE_NOT_FOUND",
            CaseError::Io(_) => "IO_ERROR",
            CaseError::Wrapped { .. } => "WRAPPED_ERROR",
        }
    }

    /// Whether the user can fix the problem and try again from the same screen
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CaseError::Validation(_) | CaseError::Precondition(_) | CaseError::Sync(_)
        )
    }

    /// Wrap an error with additional context
    pub fn wrap<E: std::fmt::Display>(error: E, context: impl Into<String>) -> Self {
        CaseError::Wrapped {
            context: context.into(),
            message: error.to_string(),
        }
    }
}

/// Convert an error to an appropriate exit code
pub fn to_exit_code(error: &CaseError) -> i32 {
    match error {
        CaseError::Validation(_) => 2,
        CaseError::Precondition(_) => 3,
        CaseError::Sync(_) => 4,
        CaseError::NotFound(_) | CaseError::Inactive(_) => 5,
        CaseError::Transport(_) => 6,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CaseError::Validation("x".into()).code(), "VALIDATION");
        assert_eq!(CaseError::Precondition("x".into()).code(), "PRECONDITION");
        assert_eq!(CaseError::Sync("x".into()).code(), "SYNC");
        assert_eq!(CaseError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(CaseError::Inactive("x".into()).code(), "INACTIVE");
        assert_eq!(CaseError::Transport("x".into()).code(), "TRANSPORT");
        assert_eq!(CaseError::NotSupported("x".into()).code(), "NOT_SUPPORTED");
        assert_eq!(CaseError::InvalidJson("x".into()).code(), "INVALID_JSON");
        assert_eq!(CaseError::ConfigError("x".into()).code(), "CONFIG_ERROR");
        assert_eq!(CaseError::FileNotFound("x".into()).code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(to_exit_code(&CaseError::Validation("x".into())), 2);
        assert_eq!(to_exit_code(&CaseError::Precondition("x".into())), 3);
        assert_eq!(to_exit_code(&CaseError::Sync("x".into())), 4);
        assert_eq!(to_exit_code(&CaseError::NotFound("x".into())), 5);
        assert_eq!(to_exit_code(&CaseError::Inactive("x".into())), 5);
        assert_eq!(to_exit_code(&CaseError::Transport("x".into())), 6);
        assert_eq!(to_exit_code(&CaseError::ConfigError("x".into())), 1);
    }

    #[test]
    fn test_recoverable() {
        assert!(CaseError::Validation("x".into()).is_recoverable());
        assert!(CaseError::Precondition("x".into()).is_recoverable());
        assert!(CaseError::Sync("x".into()).is_recoverable());
        assert!(!CaseError::Transport("x".into()).is_recoverable());
        assert!(!CaseError::NotFound("x".into()).is_recoverable());
    }

    #[test]
    fn test_transport_message_is_verbatim() {
        let err = CaseError::Transport("HTTP 500: database unavailable".into());
        assert_eq!(err.to_string(), "HTTP 500: database unavailable");
    }

    #[test]
    fn test_wrap_error() {
        let wrapped = CaseError::wrap("inner error", "outer context");
        assert_eq!(wrapped.code(), "WRAPPED_ERROR");
        assert!(wrapped.to_string().contains("outer context"));
        assert!(wrapped.to_string().contains("inner error"));
    }
}
