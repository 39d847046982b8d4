//! Prometheus recorder for the middleware metrics
//!
//! The `auth-refresh` crate emits through the `metrics` facade; this module
//! installs the recorder that collects them so `--metrics` can print the text
//! exposition at exit.

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Refresh calls range from a fast token endpoint to a stalled one.
const REFRESH_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Queued requests settled per refresh.
const WAITER_BUCKETS: &[f64] = &[0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("auth_refresh_duration_seconds".to_string()),
            REFRESH_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full("auth_refresh_waiters".to_string()),
            WAITER_BUCKETS,
        )
}

/// Install the Prometheus recorder globally and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}
