//! Error types for magpie

use thiserror::Error;

/// Result type alias for magpie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for magpie operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persistent store error
    #[error("Store error: {0}")]
    Store(#[from] magpie_db::Error),

    /// Hosting-platform API error
    #[error("Host API error: {message}")]
    Host { message: String, transient: bool },

    /// Generative review service error
    #[error("Model error: {message}")]
    Model { message: String, transient: bool },

    /// Structured model output failed the review contract
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fatal precondition violation, never retried
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Host-API error that may succeed on retry
    pub fn host_transient(message: impl Into<String>) -> Self {
        Error::Host {
            message: message.into(),
            transient: true,
        }
    }

    /// Host-API error that will not succeed on retry
    pub fn host_fatal(message: impl Into<String>) -> Self {
        Error::Host {
            message: message.into(),
            transient: false,
        }
    }

    /// Model-service error that may succeed on retry
    pub fn model_transient(message: impl Into<String>) -> Self {
        Error::Model {
            message: message.into(),
            transient: true,
        }
    }

    /// Model-service error that will not succeed on retry
    pub fn model_fatal(message: impl Into<String>) -> Self {
        Error::Model {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether a pipeline step hitting this error should retry
    ///
    /// Store errors are retriable except lookups that found nothing; host and
    /// model errors carry their own classification from HTTP status. Everything
    /// else (validation, preconditions, config, serialization) is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Host { transient, .. } | Error::Model { transient, .. } => *transient,
            Error::Store(magpie_db::Error::NotFound(_)) => false,
            Error::Store(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::host_transient("timeout").is_transient());
        assert!(!Error::host_fatal("404").is_transient());
        assert!(Error::model_transient("overloaded").is_transient());
        assert!(!Error::Validation("bad verdict".to_string()).is_transient());
        assert!(!Error::Precondition("missing repository".to_string()).is_transient());
        assert!(!Error::Store(magpie_db::Error::NotFound("review 1".to_string())).is_transient());
    }
}
