//! Single-flight token refresh on 401 responses
//!
//! The coordinator owns a two-state machine (`Idle`, `Refreshing`) and a FIFO
//! queue of requests waiting on the refresh in flight. Both live behind one
//! tokio `Mutex` so the state check-and-set and queue mutation are atomic with
//! respect to each other.
//!
//! Transitions, evaluated for every response:
//! - non-401 outcome → returned untouched
//! - 401 on a request already replayed → `on_logout`, original error returned
//! - 401 while `Idle` → mark retried, `Refreshing`, spawn the refresh episode
//! - 401 while `Refreshing` → mark retried, enqueue, await the shared outcome
//!
//! The episode runs in its own task. Dropping the caller that started it does
//! not leave the coordinator stuck in `Refreshing`.

use api_client::{ApiClient, ApiRequest, ApiResponse, ResponseInterceptor};
use common::Secret;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::handlers::AuthHandlers;
use crate::metrics::{self as auth_metrics, LogoutReason};

/// Refresh state of a coordinator.
///
/// Transitions:
/// - Idle → Refreshing (first 401 on a request not yet replayed)
/// - Refreshing → Idle (refresh settled, queue drained in the same step)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// A request parked until the refresh in flight settles.
struct PendingRequest {
    request_id: Uuid,
    settle: oneshot::Sender<Result<Secret<String>>>,
}

/// State and queue, mutated only under the coordinator's lock.
///
/// Invariant: `queue` is non-empty only while `state` is `Refreshing`.
struct Shared {
    state: RefreshState,
    queue: Vec<PendingRequest>,
}

/// Response interceptor that refreshes the access token once per episode and
/// replays every request that failed with 401 while it was running.
pub struct RefreshCoordinator {
    handlers: Arc<dyn AuthHandlers>,
    shared: Arc<Mutex<Shared>>,
    refresh_timeout: Option<Duration>,
}

impl RefreshCoordinator {
    pub fn new(handlers: Arc<dyn AuthHandlers>) -> Self {
        Self {
            handlers,
            shared: Arc::new(Mutex::new(Shared {
                state: RefreshState::Idle,
                queue: Vec::new(),
            })),
            refresh_timeout: None,
        }
    }

    /// Fail a refresh that takes longer than `timeout`.
    ///
    /// A timed-out refresh is handled like any other refresh failure: waiters
    /// are rejected and the session is logged out.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    pub async fn state(&self) -> RefreshState {
        self.shared.lock().await.state
    }

    /// Number of requests waiting on the refresh in flight.
    pub async fn queued(&self) -> usize {
        self.shared.lock().await.queue.len()
    }

    async fn handle_unauthorized(
        &self,
        client: &ApiClient,
        mut request: ApiRequest,
        error: api_client::Error,
    ) -> api_client::Result<ApiResponse> {
        let request_id = request.id();

        if request.is_retried() {
            warn!(
                %request_id,
                path = %request.path,
                "401 after token refresh, logging out"
            );
            auth_metrics::record_logout(LogoutReason::RepeatedUnauthorized);
            self.handlers.on_logout().await;
            return Err(error);
        }
        request.mark_retried();

        let token = self.join_refresh(request_id).await?;
        request.set_bearer(token.expose())?;
        debug!(%request_id, "replaying request with refreshed token");
        client.replay(request).await
    }

    /// Start a refresh episode or queue behind the one in flight, then wait
    /// for its outcome.
    async fn join_refresh(&self, request_id: Uuid) -> Result<Secret<String>> {
        let mut shared = self.shared.lock().await;
        let state = shared.state;
        match state {
            RefreshState::Refreshing => {
                let (settle, outcome) = oneshot::channel();
                shared.queue.push(PendingRequest { request_id, settle });
                debug!(
                    %request_id,
                    queued = shared.queue.len(),
                    "refresh in flight, queueing request"
                );
                drop(shared);
                outcome.await.unwrap_or(Err(Error::RefreshAbandoned))
            }
            RefreshState::Idle => {
                shared.state = RefreshState::Refreshing;
                drop(shared);
                info!(%request_id, "access token rejected, refreshing");

                let episode = tokio::spawn(run_episode(
                    self.handlers.clone(),
                    self.shared.clone(),
                    self.refresh_timeout,
                ));
                episode.await.unwrap_or_else(|e| {
                    Err(Error::RefreshFailed(format!(
                        "refresh episode aborted: {e}"
                    )))
                })
            }
        }
    }
}

/// One refresh episode: call the handler once, then settle every waiter.
///
/// Runs detached from the request that started it, so every outcome
/// (including a handler panic) ends with the queue drained and `Idle` restored.
async fn run_episode(
    handlers: Arc<dyn AuthHandlers>,
    shared: Arc<Mutex<Shared>>,
    refresh_timeout: Option<Duration>,
) -> Result<Secret<String>> {
    let started = Instant::now();

    // A panicking handler surfaces here as a JoinError and takes the failure path.
    let refresh = {
        let handlers = handlers.clone();
        tokio::spawn(async move { handlers.refresh_tokens().await })
    };
    let abort = refresh.abort_handle();
    let joined = async {
        refresh
            .await
            .unwrap_or_else(|e| Err(Error::RefreshFailed(format!("refresh task aborted: {e}"))))
    };
    let outcome = match refresh_timeout {
        Some(limit) => match tokio::time::timeout(limit, joined).await {
            Ok(outcome) => outcome,
            Err(_) => {
                abort.abort();
                Err(Error::RefreshTimedOut(limit))
            }
        },
        None => joined.await,
    };

    // Log out before leaving Refreshing so no new episode can start against
    // a session that is being torn down.
    if let Err(e) = &outcome {
        warn!(error = %e, "token refresh failed, logging out");
        auth_metrics::record_logout(LogoutReason::RefreshFailed);
        handlers.on_logout().await;
    }

    let waiters = settle_waiters(&shared, &outcome).await;
    auth_metrics::record_refresh(outcome.is_ok(), waiters, started.elapsed());
    if outcome.is_ok() {
        info!(
            waiters,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "token refresh succeeded"
        );
    }
    outcome
}

/// Return to `Idle`, drain the whole queue in the same critical section, then
/// deliver `outcome` to each waiter in arrival order. Returns the number drained.
async fn settle_waiters(shared: &Mutex<Shared>, outcome: &Result<Secret<String>>) -> usize {
    let waiters = {
        let mut shared = shared.lock().await;
        shared.state = RefreshState::Idle;
        std::mem::take(&mut shared.queue)
    };

    let count = waiters.len();
    for pending in waiters {
        if pending.settle.send(outcome.clone()).is_err() {
            debug!(request_id = %pending.request_id, "waiter dropped before refresh settled");
        }
    }
    count
}

impl ResponseInterceptor for RefreshCoordinator {
    fn on_response<'a>(
        &'a self,
        client: &'a ApiClient,
        request: ApiRequest,
        outcome: api_client::Result<ApiResponse>,
    ) -> Pin<Box<dyn Future<Output = api_client::Result<ApiResponse>> + Send + 'a>> {
        Box::pin(async move {
            match outcome {
                Err(error) if error.is_unauthorized() => {
                    self.handle_unauthorized(client, request, error).await
                }
                other => other,
            }
        })
    }
}
