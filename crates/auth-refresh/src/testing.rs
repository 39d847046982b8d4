//! Test doubles shared by the interceptor and coordinator tests.

use common::Secret;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::handlers::AuthHandlers;

/// In-memory session with scripted refresh behavior and call counters.
pub struct MockHandlers {
    pub token: Mutex<Option<String>>,
    /// `Ok(new_token)` or `Err(message)` returned by every refresh.
    pub refresh_result: std::result::Result<String, String>,
    pub refresh_delay: Duration,
    /// When set, refresh waits for `gate.notify_one()` before continuing.
    pub gated: bool,
    pub gate: Notify,
    pub lookup_fails: bool,
    /// When set, refresh panics instead of settling.
    pub panics: bool,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl MockHandlers {
    pub fn new(token: Option<&str>, refresh_result: std::result::Result<&str, &str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
            refresh_result: refresh_result.map(str::to_string).map_err(str::to_string),
            refresh_delay: Duration::ZERO,
            gated: false,
            gate: Notify::new(),
            lookup_fails: false,
            panics: false,
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.lookup_fails = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn set_token(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

impl AuthHandlers for MockHandlers {
    fn access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Secret<String>>>> + Send + '_>> {
        Box::pin(async move {
            if self.lookup_fails {
                return Err(Error::TokenLookup("keychain unavailable".into()));
            }
            Ok(self.token.lock().unwrap().clone().map(Secret::new))
        })
    }

    fn refresh_tokens(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Secret<String>>> + Send + '_>> {
        Box::pin(async move {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if self.gated {
                self.gate.notified().await;
            }
            tokio::time::sleep(self.refresh_delay).await;
            if self.panics {
                panic!("refresh handler crashed");
            }
            match &self.refresh_result {
                Ok(token) => {
                    *self.token.lock().unwrap() = Some(token.clone());
                    Ok(Secret::new(token.clone()))
                }
                Err(message) => Err(Error::RefreshFailed(message.clone())),
            }
        })
    }

    fn on_logout(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            *self.token.lock().unwrap() = None;
        })
    }
}

/// One request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub authorization: Option<String>,
}

/// Mock school API that accepts only `Bearer <valid>`.
///
/// - `/always-401` rejects every request
/// - `/status/500` fails with a server error
/// - any other path answers 200 with `{"path", "authorization"}` when the
///   bearer token matches, 401 otherwise
///
/// Every request is appended to the returned log.
pub async fn start_upstream(valid: &'static str) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Arc<Mutex<Vec<Seen>>> = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        let app = axum::Router::new().fallback(
            move |request: axum::http::Request<axum::body::Body>| {
                let log = log.clone();
                async move {
                    use axum::http::StatusCode;

                    let path = request.uri().path().to_string();
                    let authorization = request
                        .headers()
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    log.lock().unwrap().push(Seen {
                        path: path.clone(),
                        authorization: authorization.clone(),
                    });

                    let expected = format!("Bearer {valid}");
                    let (status, body) = if path == "/status/500" {
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            serde_json::json!({"error": "database unavailable"}),
                        )
                    } else if path != "/always-401"
                        && authorization.as_deref() == Some(expected.as_str())
                    {
                        (
                            StatusCode::OK,
                            serde_json::json!({"path": path, "authorization": authorization}),
                        )
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            serde_json::json!({"error": "token expired"}),
                        )
                    };
                    (status, axum::Json(body))
                }
            },
        );
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

/// Poll `check` until it holds, failing the test after five seconds.
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
