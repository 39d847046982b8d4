//! Error types for session storage and token refresh

/// Errors from session storage and the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token refresh failed: {0}")]
    TokenExchange(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("session parse error: {0}")]
    SessionParse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("no active session")]
    NoSession,
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
