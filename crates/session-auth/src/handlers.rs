//! `AuthHandlers` backed by the session file

use auth_refresh::AuthHandlers;
use common::Secret;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

use crate::session::SessionStore;
use crate::token::refresh_token;

/// Session handlers for the authentication middleware.
pub struct StoredSession {
    store: Arc<SessionStore>,
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
}

impl StoredSession {
    pub fn new(
        store: Arc<SessionStore>,
        http: reqwest::Client,
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            http,
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}

impl AuthHandlers for StoredSession {
    fn access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = auth_refresh::Result<Option<Secret<String>>>> + Send + '_>>
    {
        Box::pin(async move { Ok(self.store.get().await.map(|s| Secret::new(s.access))) })
    }

    fn refresh_tokens(
        &self,
    ) -> Pin<Box<dyn Future<Output = auth_refresh::Result<Secret<String>>> + Send + '_>> {
        Box::pin(async move {
            let session = self.store.get().await.ok_or_else(|| {
                auth_refresh::Error::RefreshFailed("no active session".into())
            })?;

            let response = refresh_token(
                &self.http,
                &self.token_endpoint,
                &self.client_id,
                &session.refresh,
            )
            .await
            .map_err(|e| auth_refresh::Error::RefreshFailed(e.to_string()))?;

            let expires = crate::expiry_from_now(response.expires_in);
            if let Err(e) = self
                .store
                .update_token(
                    response.access_token.clone(),
                    response.refresh_token,
                    expires,
                )
                .await
            {
                warn!(error = %e, "failed to persist refreshed session");
            }
            info!(expires_in = response.expires_in, "session refreshed");
            Ok(Secret::new(response.access_token))
        })
    }

    fn on_logout(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if let Err(e) = self.store.clear().await {
                warn!(error = %e, "failed to clear session on logout");
            }
        })
    }
}
