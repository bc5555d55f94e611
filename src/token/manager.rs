//! OAuth2 Authenticator
//!
//! Supplies a valid bearer token for every outgoing API request. The token is
//! restored from the [`TokenStore`] and only requested again when absent or
//! expired; a token is never attached once its computed expiry has passed.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{Cache, HttpRequest, HttpTransport};
use crate::error::LibLynxError;
use crate::flows::ClientCredentialsFlow;
use crate::telemetry::{LogContext, Logger};
use crate::token::TokenStore;
use crate::types::{CachedToken, LibLynxConfig, TokenResponse};

/// Where the token handed out by [`OAuth2Authenticator::access_token`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Restored from the cache.
    Cache,
    /// Obtained with the refresh grant.
    Refreshed,
    /// Obtained with the client credentials grant.
    Granted,
}

impl TokenSource {
    /// True when the token was issued during this call.
    pub fn is_fresh(&self) -> bool {
        !matches!(self, Self::Cache)
    }
}

/// Bearer token provider backed by the token endpoint and the token store.
pub struct OAuth2Authenticator {
    flow: ClientCredentialsFlow,
    store: TokenStore,
    expiry_buffer: chrono::Duration,
    client_id: String,
    logger: Arc<dyn Logger>,
}

impl OAuth2Authenticator {
    /// Create an authenticator for the configured client.
    pub fn new(
        config: &LibLynxConfig,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<dyn Cache>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let store = match &config.token_cache_key {
            Some(key) => TokenStore::with_key(cache, key.clone()),
            None => TokenStore::new(cache, &config.credentials.client_id),
        };

        Self {
            flow: ClientCredentialsFlow::new(config.clone(), transport),
            store,
            expiry_buffer: to_chrono(config.token_expiry_buffer),
            client_id: config.credentials.client_id.clone(),
            logger,
        }
    }

    /// The underlying token store.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Get a valid access token, requesting a new one when needed.
    ///
    /// At most one refresh grant and one client credentials grant are sent
    /// per call.
    pub async fn access_token(&self) -> Result<(CachedToken, TokenSource), LibLynxError> {
        let context = LogContext::new()
            .operation("access_token")
            .client_id(&self.client_id);

        let refresh_token = match self.store.restore().await? {
            Some(token) if !token.is_expired(self.expiry_buffer) => {
                self.logger.debug("using stored access token", &context);
                return Ok((token, TokenSource::Cache));
            }
            Some(token) => {
                self.logger.debug("stored access token has expired", &context);
                token.refresh_token
            }
            None => {
                self.logger.debug("no stored access token", &context);
                None
            }
        };

        if let Some(refresh_token) = refresh_token {
            match self.flow.refresh_token(&refresh_token).await {
                Ok(mut response) => {
                    if response.refresh_token.is_none() {
                        response.refresh_token = Some(refresh_token);
                    }
                    let token = self.persist(response).await?;
                    self.logger.info("access token refreshed", &context);
                    return Ok((token, TokenSource::Refreshed));
                }
                Err(e) => {
                    self.logger.warn(
                        &format!("token refresh failed, requesting a new token: {e}"),
                        &context,
                    );
                }
            }
        }

        match self.flow.request_token().await {
            Ok(response) => {
                let token = self.persist(response).await?;
                self.logger.info("access token granted", &context);
                Ok((token, TokenSource::Granted))
            }
            Err(e) => {
                let context = match e.status() {
                    Some(status) => context.status(status),
                    None => context,
                };
                self.logger
                    .error(&format!("client credentials grant failed: {e}"), &context);
                Err(e)
            }
        }
    }

    /// Attach a bearer token to a request.
    pub async fn authenticate(
        &self,
        request: HttpRequest,
    ) -> Result<(HttpRequest, TokenSource), LibLynxError> {
        let (token, source) = self.access_token().await?;
        Ok((
            request.header("authorization", token.authorization_header()),
            source,
        ))
    }

    /// Forget the stored token so the next call requests a new one.
    pub async fn invalidate(&self) -> Result<(), LibLynxError> {
        self.store.delete().await?;
        self.logger.debug(
            "stored access token discarded",
            &LogContext::new()
                .operation("invalidate_token")
                .client_id(&self.client_id),
        );
        Ok(())
    }

    async fn persist(&self, response: TokenResponse) -> Result<CachedToken, LibLynxError> {
        let token = CachedToken::from_response(response, Utc::now());
        self.store.save(&token).await?;
        Ok(token)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::LibLynxConfigBuilder;
    use crate::core::{InMemoryCache, MockHttpTransport};
    use crate::error::ErrorKind;
    use crate::telemetry::{InMemoryLogger, LogLevel};
    use serde_json::json;

    struct Fixture {
        authenticator: OAuth2Authenticator,
        transport: Arc<MockHttpTransport>,
        cache: Arc<InMemoryCache>,
        logger: Arc<InMemoryLogger>,
    }

    fn fixture() -> Fixture {
        let config = LibLynxConfigBuilder::new()
            .api_root("http://localhost")
            .credentials("testid", "testsecret")
            .build()
            .unwrap();
        let transport = Arc::new(MockHttpTransport::new());
        let cache = Arc::new(InMemoryCache::new());
        let logger = Arc::new(InMemoryLogger::new());
        let authenticator =
            OAuth2Authenticator::new(&config, transport.clone(), cache.clone(), logger.clone());
        Fixture {
            authenticator,
            transport,
            cache,
            logger,
        }
    }

    fn token_body(access: &str, expires_in: u64) -> serde_json::Value {
        json!({
            "access_token": access,
            "expires_in": expires_in,
            "token_type": "bearer",
            "scope": null,
            "refresh_token": format!("refresh-{access}")
        })
    }

    #[tokio::test]
    async fn test_token_is_granted_once_then_reused() {
        let f = fixture();
        f.transport.queue_json_response(200, &token_body("first", 3600));

        let (token, source) = f.authenticator.access_token().await.unwrap();
        assert_eq!(token.access_token, "first");
        assert_eq!(source, TokenSource::Granted);

        let (token, source) = f.authenticator.access_token().await.unwrap();
        assert_eq!(token.access_token, "first");
        assert_eq!(source, TokenSource::Cache);
        assert_eq!(f.transport.request_count(), 1);
        assert!(f.cache.has("oauth2-token:testid").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let f = fixture();
        // Expires inside the default 60s buffer.
        f.transport.queue_json_response(200, &token_body("stale", 30));
        f.transport.queue_json_response(
            200,
            &json!({"access_token": "renewed", "expires_in": 3600, "token_type": "bearer"}),
        );

        f.authenticator.access_token().await.unwrap();
        let (token, source) = f.authenticator.access_token().await.unwrap();

        assert_eq!(source, TokenSource::Refreshed);
        assert_eq!(token.access_token, "renewed");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh-stale"));

        let requests = f.transport.get_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1]
            .body
            .as_deref()
            .unwrap()
            .starts_with("grant_type=refresh_token"));
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_client_credentials() {
        let f = fixture();
        f.transport.queue_json_response(200, &token_body("stale", 0));
        f.transport
            .queue_json_response(400, &json!({"error": "invalid_grant"}));
        f.transport.queue_json_response(200, &token_body("fresh", 3600));

        f.authenticator.access_token().await.unwrap();
        let (token, source) = f.authenticator.access_token().await.unwrap();

        assert_eq!(source, TokenSource::Granted);
        assert_eq!(token.access_token, "fresh");
        assert_eq!(f.transport.request_count(), 3);
        assert_eq!(f.logger.count(LogLevel::Warn), 1);
    }

    #[tokio::test]
    async fn test_grant_failure_is_authentication_error() {
        let f = fixture();
        f.transport
            .queue_json_response(401, &json!({"error": "invalid_client"}));

        let err = f.authenticator.access_token().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(f.transport.request_count(), 1);
        assert!(f.logger.contains("client credentials grant failed"));
        assert!(!f.authenticator.store().has_token().await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_sets_bearer_header() {
        let f = fixture();
        f.transport.queue_json_response(200, &token_body("abc", 3600));

        let request = HttpRequest::new(crate::core::HttpMethod::Get, "http://localhost/api");
        let (request, source) = f.authenticator.authenticate(request).await.unwrap();
        assert!(source.is_fresh());
        assert_eq!(request.get_header("authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_grant() {
        let f = fixture();
        f.transport.queue_json_response(200, &token_body("one", 3600));
        f.transport.queue_json_response(200, &token_body("two", 3600));

        f.authenticator.access_token().await.unwrap();
        f.authenticator.invalidate().await.unwrap();
        let (token, source) = f.authenticator.access_token().await.unwrap();

        assert_eq!(token.access_token, "two");
        assert_eq!(source, TokenSource::Granted);
    }
}
