//! Request-leg interceptor that attaches the current access token

use api_client::{ApiRequest, RequestInterceptor};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::handlers::AuthHandlers;

/// Sets `Authorization: Bearer <token>` from `AuthHandlers::access_token`.
///
/// Never fails the pipeline: a missing token, a failed lookup or a token that
/// is not a valid header value all forward the request unchanged.
pub struct BearerInterceptor {
    handlers: Arc<dyn AuthHandlers>,
}

impl BearerInterceptor {
    pub fn new(handlers: Arc<dyn AuthHandlers>) -> Self {
        Self { handlers }
    }
}

impl RequestInterceptor for BearerInterceptor {
    fn on_request<'a>(
        &'a self,
        request: &'a mut ApiRequest,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            match self.handlers.access_token().await {
                Ok(Some(token)) => {
                    if let Err(e) = request.set_bearer(token.expose()) {
                        warn!(
                            request_id = %request.id(),
                            error = %e,
                            "access token unusable, sending without it"
                        );
                    }
                }
                Ok(None) => {
                    debug!(request_id = %request.id(), "no access token, sending unauthenticated");
                }
                Err(e) => {
                    warn!(
                        request_id = %request.id(),
                        error = %e,
                        "access token lookup failed, sending without it"
                    );
                }
            }
        })
    }
}
