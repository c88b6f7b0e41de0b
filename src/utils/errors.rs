//! Error handling for AscentBot
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for AscentBot application
#[derive(Error, Debug)]
pub enum AscentError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Payment provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Donation not found: {donation_id}")]
    DonationNotFound { donation_id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Payment provider specific errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider request timed out")]
    Timeout,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Unknown payment status: {0}")]
    UnknownStatus(String),
}

/// Result type alias for AscentBot operations
pub type Result<T> = std::result::Result<T, AscentError>;

/// Result type alias for payment provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl AscentError {
    /// Check if the error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        match self {
            AscentError::Database(_) => true,
            AscentError::Migration(_) => false,
            AscentError::Telegram(_) => true,
            AscentError::Provider(_) => true,
            AscentError::Config(_) => false,
            AscentError::UserNotFound { .. } => false,
            AscentError::DonationNotFound { .. } => false,
            AscentError::InvalidInput(_) => false,
            AscentError::InvariantViolation(_) => false,
            AscentError::Http(_) => true,
            AscentError::Serialization(_) => false,
            AscentError::Io(_) => true,
        }
    }

    /// Uniform user-facing text for errors worth retrying. Internals never
    /// leak into the returned message.
    pub fn user_notice(&self) -> Option<&'static str> {
        if self.is_recoverable() {
            Some("Something went wrong, please try again.")
        } else {
            None
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AscentError::Migration(_) => ErrorSeverity::Critical,
            AscentError::Config(_) => ErrorSeverity::Critical,
            AscentError::Database(_) => ErrorSeverity::Error,
            AscentError::InvalidInput(_) => ErrorSeverity::Info,
            AscentError::InvariantViolation(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violations_are_not_retried() {
        let err = AscentError::InvariantViolation("level regression".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_provider_errors_are_recoverable() {
        let err = AscentError::Provider(ProviderError::Timeout);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_recoverable_errors_carry_a_retry_notice() {
        let err = AscentError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.user_notice(), Some("Something went wrong, please try again."));

        let err = AscentError::Provider(ProviderError::Timeout);
        assert!(err.user_notice().is_some());
    }

    #[test]
    fn test_user_mistakes_get_no_retry_notice() {
        let err = AscentError::InvalidInput("bad amount".to_string());
        assert_eq!(err.user_notice(), None);
    }

    #[test]
    fn test_retry_notice_does_not_leak_error_details() {
        let err = AscentError::Database(sqlx::Error::RowNotFound);
        let notice = err.user_notice().unwrap();
        assert!(!notice.contains("Database"));
        assert!(!notice.contains("row"));
    }
}
