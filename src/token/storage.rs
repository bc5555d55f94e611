//! Token Storage
//!
//! Persists the OAuth2 token in the shared [`Cache`] so that other client
//! instances, and other processes on a shared backend, reuse it.
//! Expiry is not checked here; see [`crate::token::OAuth2Authenticator`].

use serde_json::Value;
use std::sync::Arc;

use crate::core::Cache;
use crate::error::{LibLynxError, StorageError};
use crate::types::CachedToken;

/// Prefix of the default token cache key.
pub const TOKEN_KEY_PREFIX: &str = "oauth2-token";

/// Cache-backed token persistence.
pub struct TokenStore {
    cache: Arc<dyn Cache>,
    key: String,
}

impl TokenStore {
    /// Store the token of `client_id` under `oauth2-token:{client_id}`.
    pub fn new(cache: Arc<dyn Cache>, client_id: &str) -> Self {
        Self::with_key(cache, format!("{TOKEN_KEY_PREFIX}:{client_id}"))
    }

    /// Store the token under an explicit key.
    pub fn with_key(cache: Arc<dyn Cache>, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
        }
    }

    /// Cache key in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persist a token. Tokens are kept until replaced or deleted.
    pub async fn save(&self, token: &CachedToken) -> Result<(), LibLynxError> {
        let value = serde_json::to_value(token).map_err(|e| StorageError::WriteFailed {
            message: format!("token is not serializable: {e}"),
        })?;
        self.cache.set(&self.key, value, None).await
    }

    /// Restore the persisted token.
    ///
    /// A stored value that is not a token object reads as no token, which
    /// forces a new grant instead of failing the request.
    pub async fn restore(&self) -> Result<Option<CachedToken>, LibLynxError> {
        let value = match self.cache.get(&self.key).await? {
            Some(value @ Value::Object(_)) => value,
            Some(_) | None => return Ok(None),
        };

        match serde_json::from_value::<CachedToken>(value) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "discarding unreadable cached token");
                Ok(None)
            }
        }
    }

    /// Remove the persisted token.
    pub async fn delete(&self) -> Result<bool, LibLynxError> {
        self.cache.delete(&self.key).await
    }

    /// Check whether a token is persisted.
    pub async fn has_token(&self) -> Result<bool, LibLynxError> {
        self.cache.has(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InMemoryCache, MockCache};
    use crate::error::{ErrorKind, StorageError};
    use crate::types::TokenResponse;
    use chrono::Utc;
    use serde_json::json;

    fn token() -> CachedToken {
        CachedToken::from_response(
            TokenResponse {
                access_token: "abcdefghijklmnop".to_string(),
                token_type: "bearer".to_string(),
                expires_in: Some(3600),
                refresh_token: Some("0123456789abcdef".to_string()),
                scope: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_restore_token_custom_key() {
        let cache = Arc::new(InMemoryCache::new());
        let store = TokenStore::with_key(cache.clone(), "foo-bar");

        let before = token();
        store.save(&before).await.unwrap();
        assert!(cache.has("foo-bar").await.unwrap());

        let after = store.restore().await.unwrap().unwrap();
        assert_eq!(before, after);

        assert!(store.delete().await.unwrap());
        assert!(store.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_key_is_namespaced_by_client() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let first = TokenStore::new(cache.clone(), "1_first");
        let second = TokenStore::new(cache, "2_second");
        assert_eq!(first.key(), "oauth2-token:1_first");

        first.save(&token()).await.unwrap();
        assert!(first.has_token().await.unwrap());
        assert!(!second.has_token().await.unwrap());
        assert!(second.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_object_value_reads_as_no_token() {
        let cache = Arc::new(InMemoryCache::new());
        let store = TokenStore::new(cache.clone(), "1_abc");

        cache
            .set(store.key(), json!("serialized-garbage"), None)
            .await
            .unwrap();
        assert!(store.restore().await.unwrap().is_none());

        cache
            .set(store.key(), json!({"unexpected": true}), None)
            .await
            .unwrap();
        assert!(store.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let mut cache = MockCache::new();
        cache.expect_get().returning(|_| {
            Err(StorageError::ReadFailed {
                message: "connection reset".to_string(),
            }
            .into())
        });

        let store = TokenStore::new(Arc::new(cache), "1_abc");
        let err = store.restore().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_save_writes_token_object_without_ttl() {
        let mut cache = MockCache::new();
        cache
            .expect_set()
            .withf(|key, value, ttl| {
                key == "oauth2-token:1_abc"
                    && value["access_token"] == "abcdefghijklmnop"
                    && value["expires_at"].is_string()
                    && ttl.is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let store = TokenStore::new(Arc::new(cache), "1_abc");
        store.save(&token()).await.unwrap();
    }
}
