//! HTTP client core for the campus REST API
//!
//! `ApiClient` owns the base URL, the per-request timeout and an interception
//! pipeline with two legs:
//!
//! 1. Request interceptors run in registration order before each `send`.
//!    They may rewrite headers but cannot fail the request.
//! 2. A single response interceptor sees every outcome (success or error)
//!    before it resolves to the caller. It receives the request descriptor by
//!    value and may re-issue it through `ApiClient::replay`.
//!
//! Non-2xx responses surface as `Error::Status`, so auth failures arrive on
//! the error leg of the response interceptor.

pub mod client;
pub mod error;
pub mod request;

pub use client::{ApiClient, ClientBuilder};
pub use error::{Error, Result};
pub use request::{ApiRequest, ApiResponse};

use std::future::Future;
use std::pin::Pin;

/// Hook on the outbound leg. Runs before each request is transmitted.
///
/// Uses `Pin<Box<dyn Future>>` return types so implementors can be stored as
/// `Arc<dyn RequestInterceptor>`.
pub trait RequestInterceptor: Send + Sync {
    fn on_request<'a>(
        &'a self,
        request: &'a mut ApiRequest,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Hook on the inbound leg. Sees every outcome before it resolves to the caller.
///
/// The returned result is what the caller observes. Implementors that pass an
/// outcome through untouched must return it unchanged.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response<'a>(
        &'a self,
        client: &'a ApiClient,
        request: ApiRequest,
        outcome: Result<ApiResponse>,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>>;
}
