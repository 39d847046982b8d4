//! `ApiClient` and its builder
//!
//! The client is cheap to clone; clones share the connection pool and the
//! interceptor chain. Separately built clients share nothing.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::request::{ApiRequest, ApiResponse};
use crate::{RequestInterceptor, ResponseInterceptor};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for `ApiClient`.
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptor: Option<Arc<dyn ResponseInterceptor>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            request_interceptors: Vec::new(),
            response_interceptor: None,
        }
    }
}

impl ClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Per-request timeout applied to every dispatch, replays included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Append a request interceptor. Interceptors run in registration order.
    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Set the response interceptor, replacing any previous one.
    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptor = Some(interceptor);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Builder("base_url is required".into()))?;
        common::Error::check_url("base_url", &base_url)
            .map_err(|e| Error::Builder(e.to_string()))?;
        if self.timeout.is_zero() {
            return Err(Error::Builder("timeout must be greater than 0".into()));
        }

        let mut http = reqwest::Client::builder();
        if let Some(user_agent) = &self.user_agent {
            http = http.user_agent(user_agent.as_str());
        }
        let http = http
            .build()
            .map_err(|e| Error::Builder(format!("failed to build HTTP client: {e}")))?;

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout: self.timeout,
                request_interceptors: self.request_interceptors,
                response_interceptor: self.response_interceptor,
            }),
        })
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptor: Option<Arc<dyn ResponseInterceptor>>,
}

/// HTTP client with a request/response interception pipeline.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Run request interceptors, dispatch, then hand the outcome to the
    /// response interceptor.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        for interceptor in &self.inner.request_interceptors {
            interceptor.on_request(&mut request).await;
        }
        self.replay(request).await
    }

    /// Re-issue an already-constructed request.
    ///
    /// Request interceptors are skipped: headers already on the request are
    /// sent as-is. The outcome still passes through the response interceptor.
    pub async fn replay(&self, request: ApiRequest) -> Result<ApiResponse> {
        let outcome = self.dispatch(&request).await;
        match &self.inner.response_interceptor {
            Some(interceptor) => interceptor.on_response(self, request, outcome).await,
            None => outcome,
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path, body)).await
    }

    pub async fn put(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path, body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get(path).await?.json()
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.post(path, body).await?.json()
    }

    /// Resolve a request path against the base URL. Absolute URLs pass through.
    fn url_for(&self, path: &str) -> String {
        if common::is_http_url(path) {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    /// Perform the network call. Non-2xx responses become `Error::Status`.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path);
        debug!(
            request_id = %request.id(),
            method = %request.method,
            url = %url,
            retried = request.is_retried(),
            "dispatching request"
        );

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone())
            .timeout(self.inner.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.inner.timeout)
            } else {
                Error::Http(e.to_string())
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.inner.timeout)
            } else {
                Error::Http(format!("reading response body: {e}"))
            }
        })?;

        debug!(request_id = %request.id(), status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .field("request_interceptors", &self.inner.request_interceptors.len())
            .field(
                "response_interceptor",
                &self.inner.response_interceptor.is_some(),
            )
            .finish()
    }
}
