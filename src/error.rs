//! Application error types.
//!
//! Provides unified error handling with actionable context for debugging.
//! Every error here is recoverable at the request level.

use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input (date, section key, user id). Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage or network unavailable. Safe to retry.
    #[error("Storage temporarily unavailable: {message}")]
    TransientStorage {
        /// Human-readable error description.
        message: String,
        /// HTTP status code, if from an HTTP response.
        status: Option<u16>,
        /// Actionable suggestion for resolving the error.
        hint: Option<&'static str>,
    },

    /// Storage rejected the request outright (credentials, schema, conflict).
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error description.
        message: String,
        /// HTTP status code, if from an HTTP response.
        status: Option<u16>,
        /// Actionable suggestion for resolving the error.
        hint: Option<&'static str>,
    },

    /// A save is already in flight for this session.
    #[error("A save is already in progress")]
    ConcurrencyGuard,

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transient storage error with no HTTP status (connection, timeout, DNS)
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::TransientStorage {
            message: message.into(),
            status: None,
            hint: Some("Check network connectivity and SUPABASE_URL"),
        }
    }

    /// Create a storage error from an HTTP status, classifying it as transient or permanent
    pub fn storage_status(message: impl Into<String>, status: u16) -> Self {
        let hint = match status {
            401 => Some("Check the SUPABASE_KEY environment variable"),
            403 => Some("Row-level security rejected the request for this user"),
            404 => Some("The reading tables were not found - check the database schema"),
            409 => Some("The row conflicts with an existing record"),
            429 => Some("Rate limited - wait a moment and try again"),
            500..=599 => Some("Supabase server error - try again later"),
            _ => None,
        };
        let message = message.into();
        if status == 429 || (500..=599).contains(&status) {
            Self::TransientStorage { message, status: Some(status), hint }
        } else {
            Self::Storage { message, status: Some(status), hint }
        }
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Whether retrying the same request could succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStorage { .. })
    }

    /// Whether this is the in-flight save guard rejecting a request.
    pub const fn is_guard_rejection(&self) -> bool {
        matches!(self, Self::ConcurrencyGuard)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
