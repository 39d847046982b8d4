//! Callbacks the embedding application supplies to the middleware

use common::Secret;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Session hooks used by the interceptors.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn AuthHandlers>`).
pub trait AuthHandlers: Send + Sync {
    /// Current access token, or `None` when logged out.
    ///
    /// Should not fail; if it does, the request is sent without a token.
    fn access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Secret<String>>>> + Send + '_>>;

    /// Obtain a new access token.
    ///
    /// Never invoked more than once concurrently by a single coordinator, but
    /// may be called again in later refresh episodes.
    fn refresh_tokens(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Secret<String>>> + Send + '_>>;

    /// Tear down the session. Must be idempotent.
    fn on_logout(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
