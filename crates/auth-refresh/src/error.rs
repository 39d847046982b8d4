//! Error types for the authentication middleware

use std::time::Duration;

/// Errors from token lookup and refresh.
///
/// `Clone` because one refresh outcome is delivered to every waiting request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("token refresh timed out after {}ms", .0.as_millis())]
    RefreshTimedOut(Duration),

    #[error("token refresh abandoned before settling")]
    RefreshAbandoned,

    #[error("access token lookup failed: {0}")]
    TokenLookup(String),
}

/// Result alias for middleware operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for api_client::Error {
    fn from(err: Error) -> Self {
        api_client::Error::Auth(err.to_string())
    }
}
