//! Core error types for brokersync.
//!
//! Remote adapters convert transport- and API-specific failures into these
//! variants so the engine can decide, per variant, whether to retry, record
//! the failure and continue, or abort the run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryClass;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the sync engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Network hiccup, timeout or rate limit. Retried with backoff.
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Credentials rejected by a remote API. Aborts the run.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A remote API refused the payload. Recorded per item or chunk.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A source record could not be turned into a transaction.
    #[error("Malformed activity '{source_id}': {reason}")]
    MalformedActivity { source_id: String, reason: String },

    /// Invalid or missing configuration. Raised before any remote call.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Response that could not be understood (bad JSON, unexpected status).
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Serializable discriminant of [`Error`], used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    TransientNetwork,
    Authentication,
    Validation,
    MalformedActivity,
    Configuration,
    NotFound,
    Unexpected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::TransientNetwork => "TransientNetworkError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::MalformedActivity => "MalformedActivity",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Unexpected => "UnexpectedError",
        };
        write!(f, "{}", label)
    }
}

impl Error {
    pub fn malformed(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedActivity {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TransientNetwork(_) => ErrorKind::TransientNetwork,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Validation(_) => ErrorKind::Validation,
            Error::MalformedActivity { .. } => ErrorKind::MalformedActivity,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// Only transient network failures are worth another attempt; everything
    /// else fails the same way on replay.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Error::TransientNetwork(_) => RetryClass::WithBackoff,
            _ => RetryClass::Never,
        }
    }

    /// Whether this error must abort the run no matter where it happens.
    ///
    /// Per-item errors (validation, malformed records) and exhausted retries
    /// inside the commit phase are recorded instead; during fetching every
    /// error is fatal because there is no valid delta to work from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Authentication(_) | Error::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_retry() {
        assert_eq!(
            Error::TransientNetwork("timeout".into()).retry_class(),
            RetryClass::WithBackoff
        );
        assert_eq!(
            Error::Authentication("401".into()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            Error::Validation("bad symbol".into()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            Error::malformed("a-1", "qty").retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Authentication("expired".into()).is_fatal());
        assert!(Error::Configuration("chunk size".into()).is_fatal());
        assert!(!Error::Validation("bad".into()).is_fatal());
        assert!(!Error::TransientNetwork("503".into()).is_fatal());
        assert!(!Error::malformed("x", "y").is_fatal());
    }

    #[test]
    fn test_kind_display_and_serialization() {
        let err = Error::Authentication("401".into());
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.kind().to_string(), "AuthenticationError");
        assert_eq!(
            serde_json::to_string(&ErrorKind::MalformedActivity).unwrap(),
            "\"MALFORMED_ACTIVITY\""
        );
    }

    #[test]
    fn test_malformed_message_carries_source_id() {
        let err = Error::malformed("20240102::abc", "invalid qty 'x'");
        assert_eq!(
            err.to_string(),
            "Malformed activity '20240102::abc': invalid qty 'x'"
        );
    }
}
