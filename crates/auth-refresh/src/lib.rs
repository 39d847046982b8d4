//! Bearer-token authentication middleware for `api-client`
//!
//! Two interceptors cooperate around an embedding-supplied `AuthHandlers`:
//!
//! - `BearerInterceptor` (request leg) attaches `Authorization: Bearer <token>`
//!   using whatever `AuthHandlers::access_token` returns. Lookup failures are
//!   logged and the request goes out without a token.
//! - `RefreshCoordinator` (response leg) turns a 401 into a single-flight token
//!   refresh. The first 401 starts the refresh, later 401s queue behind it, and
//!   when it settles every waiter is resolved or rejected with the same outcome.
//!   A request that is rejected again after its replay triggers a logout
//!   instead of another refresh.
//!
//! Lifecycle of a request that hits an expired token:
//! 1. `BearerInterceptor` attaches the stale token, server answers 401
//! 2. `RefreshCoordinator` marks the request retried and joins (or starts) the refresh
//! 3. Refresh succeeds → request replayed once with the new token
//! 4. Refresh fails → caller receives the refresh error, session is logged out

pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod interceptor;
pub mod metrics;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{RefreshCoordinator, RefreshState};
pub use error::{Error, Result};
pub use handlers::AuthHandlers;
pub use interceptor::BearerInterceptor;

use std::sync::Arc;
use std::time::Duration;

/// Register the bearer interceptor and a fresh refresh coordinator on `builder`.
///
/// `refresh_timeout` bounds each refresh call; `None` waits for the handler
/// however long it takes. Returns the coordinator alongside the builder so the
/// caller can inspect its state.
pub fn install(
    builder: api_client::ClientBuilder,
    handlers: Arc<dyn AuthHandlers>,
    refresh_timeout: Option<Duration>,
) -> (api_client::ClientBuilder, Arc<RefreshCoordinator>) {
    let mut coordinator = RefreshCoordinator::new(handlers.clone());
    if let Some(timeout) = refresh_timeout {
        coordinator = coordinator.with_refresh_timeout(timeout);
    }
    let coordinator = Arc::new(coordinator);
    let builder = builder
        .request_interceptor(Arc::new(BearerInterceptor::new(handlers)))
        .response_interceptor(coordinator.clone());
    (builder, coordinator)
}
