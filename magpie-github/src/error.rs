//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error surfaced by octocrab
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Transport-level HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from a raw REST call
    #[error("GitHub returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// GraphQL-level errors in an otherwise successful response
    #[error("GraphQL error: {0}")]
    Graph(String),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Whether a retry against GitHub could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Api(octocrab::Error::GitHub { source, .. }) => {
                let status = source.status_code.as_u16();
                status == 429 || status >= 500
            }
            Error::Api(_) => false,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            Error::Graph(_) | Error::Auth(_) | Error::Parse(_) => false,
        }
    }
}

impl From<Error> for magpie_core::Error {
    fn from(err: Error) -> Self {
        if err.is_transient() {
            magpie_core::Error::host_transient(err.to_string())
        } else {
            magpie_core::Error::host_fatal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let rate_limited = Error::Status {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(rate_limited.is_transient());

        let server_error = Error::Status {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(server_error.is_transient());

        let not_found = Error::Status {
            status: 404,
            message: "missing".to_string(),
        };
        assert!(!not_found.is_transient());

        let unprocessable = Error::Status {
            status: 422,
            message: "validation failed".to_string(),
        };
        assert!(!unprocessable.is_transient());
    }

    #[test]
    fn test_non_http_errors_are_fatal() {
        assert!(!Error::Auth("bad token".to_string()).is_transient());
        assert!(!Error::Parse("bad json".to_string()).is_transient());
        assert!(!Error::Graph("thread not found".to_string()).is_transient());
    }

    #[test]
    fn test_conversion_preserves_transience() {
        let transient: magpie_core::Error = Error::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
        .into();
        assert!(transient.is_transient());

        let fatal: magpie_core::Error = Error::Auth("bad token".to_string()).into();
        assert!(!fatal.is_transient());
    }
}
