//! Error types for API client operations

use std::time::Duration;

/// Errors surfaced to callers of `ApiClient`.
///
/// Payloads are owned strings so the same error can be cloned to every
/// request waiting on a shared outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("client configuration invalid: {0}")]
    Builder(String),

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl Error {
    /// HTTP status code when the server answered with a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a 401 response (current token invalid or expired).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Result alias for API client operations.
pub type Result<T> = std::result::Result<T, Error>;
