//! Middleware metrics
//!
//! Emitted through the `metrics` facade; the embedding binary decides which
//! recorder (if any) collects them.
//!
//! - `auth_refresh_total` (counter): label `outcome` (`success` | `failure`)
//! - `auth_refresh_duration_seconds` (histogram)
//! - `auth_refresh_waiters` (histogram): queued requests settled per refresh
//! - `auth_logout_total` (counter): label `reason`

use std::time::Duration;

/// Why the middleware invoked `on_logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The refresh call failed or timed out.
    RefreshFailed,
    /// A request was rejected with 401 again after being replayed.
    RepeatedUnauthorized,
}

impl LogoutReason {
    pub fn label(&self) -> &'static str {
        match self {
            LogoutReason::RefreshFailed => "refresh_failed",
            LogoutReason::RepeatedUnauthorized => "repeated_unauthorized",
        }
    }
}

/// Record one settled refresh episode.
pub fn record_refresh(success: bool, waiters: usize, duration: Duration) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("auth_refresh_total", "outcome" => outcome).increment(1);
    metrics::histogram!("auth_refresh_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("auth_refresh_waiters").record(waiters as f64);
}

pub fn record_logout(reason: LogoutReason) {
    metrics::counter!("auth_logout_total", "reason" => reason.label()).increment(1);
}
