//! File-backed session for the campus API client
//!
//! Supplies the `AuthHandlers` the authentication middleware needs:
//! the access token comes from a JSON session file, refreshes use the
//! refresh-token grant against the configured token endpoint, and logout
//! deletes the session file.
//!
//! Session flow:
//! 1. `campus login` stores the initial token pair via `SessionStore::replace()`
//! 2. Every request reads the access token through `StoredSession`
//! 3. On 401 the middleware calls `StoredSession::refresh_tokens()`, which
//!    calls `token::refresh_token()` and persists the rotated pair
//! 4. A failed refresh or a repeated 401 clears the session file

pub mod error;
pub mod handlers;
pub mod session;
pub mod token;

pub use error::{Error, Result};
pub use handlers::StoredSession;
pub use session::{Session, SessionStore};
pub use token::{TokenResponse, refresh_token};

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Absolute expiry in unix milliseconds for a token valid `expires_in_secs`
/// from now. Saturates at `u64::MAX` for lifetimes too large to represent.
pub fn expiry_from_now(expires_in_secs: u64) -> u64 {
    now_millis().saturating_add(expires_in_secs.saturating_mul(1000))
}
