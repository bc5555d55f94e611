//! Configuration Builder
//!
//! Fluent builder for the LibLynx client configuration.

use std::time::Duration;

use crate::core::{validate_key, ENTRYPOINT_KEY_PREFIX};
use crate::error::{ConfigurationError, LibLynxError};
use crate::token::TOKEN_KEY_PREFIX;
use crate::types::{
    ClientAuthMethod, ClientCredentials, LibLynxConfig, DEFAULT_API_ROOT, DEFAULT_ENTRYPOINT_TTL,
};

/// Environment variable holding the client id.
pub const ENV_CLIENT_ID: &str = "LIBLYNX_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "LIBLYNX_CLIENT_SECRET";
/// Environment variable overriding the API root.
pub const ENV_API_ROOT: &str = "LIBLYNX_API_ROOT";

/// LibLynx configuration builder.
#[derive(Default)]
pub struct LibLynxConfigBuilder {
    api_root: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_method: ClientAuthMethod,
    timeout: Duration,
    token_expiry_buffer: Duration,
    entrypoint_ttl: Duration,
    token_cache_key: Option<String>,
}

impl LibLynxConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            token_expiry_buffer: Duration::from_secs(60),
            entrypoint_ttl: DEFAULT_ENTRYPOINT_TTL,
            ..Default::default()
        }
    }

    /// Builder seeded from `LIBLYNX_CLIENT_ID`, `LIBLYNX_CLIENT_SECRET` and
    /// `LIBLYNX_API_ROOT`. Unset variables leave the defaults in place.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Some(id) = non_empty_env(ENV_CLIENT_ID) {
            builder = builder.client_id(id);
        }
        if let Some(secret) = non_empty_env(ENV_CLIENT_SECRET) {
            builder = builder.client_secret(secret);
        }
        if let Some(root) = non_empty_env(ENV_API_ROOT) {
            builder = builder.api_root(root);
        }
        builder
    }

    /// Set the API root (defaults to the production service).
    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = Some(api_root.into());
        self
    }

    /// Set client ID and secret.
    pub fn credentials(self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.client_id(client_id).client_secret(client_secret)
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set client authentication method.
    pub fn auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Treat tokens as expired this long before their actual expiry.
    pub fn token_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.token_expiry_buffer = buffer;
        self
    }

    /// Set the lifetime of the persisted entry point document.
    pub fn entrypoint_ttl(mut self, ttl: Duration) -> Self {
        self.entrypoint_ttl = ttl;
        self
    }

    /// Store the token under this cache key instead of `oauth2-token:{client_id}`.
    pub fn token_cache_key(mut self, key: impl Into<String>) -> Self {
        self.token_cache_key = Some(key.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<LibLynxConfig, LibLynxError> {
        let client_id = self.client_id.filter(|id| !id.is_empty());
        let client_secret = self.client_secret.filter(|secret| !secret.is_empty());
        let (client_id, client_secret) = match (client_id, client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err(ConfigurationError::MissingCredentials.into()),
        };

        let api_root = normalize_api_root(self.api_root.as_deref().unwrap_or(DEFAULT_API_ROOT))?;

        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        // Both cache keys embed the client id.
        match &self.token_cache_key {
            Some(key) => validate_key(key)?,
            None => validate_key(&format!("{TOKEN_KEY_PREFIX}:{client_id}"))?,
        }
        validate_key(&format!("{ENTRYPOINT_KEY_PREFIX}:{client_id}"))?;

        Ok(LibLynxConfig {
            api_root,
            credentials: ClientCredentials::new(client_id, client_secret),
            auth_method: self.auth_method,
            timeout: self.timeout,
            token_expiry_buffer: self.token_expiry_buffer,
            entrypoint_ttl: self.entrypoint_ttl,
            token_cache_key: self.token_cache_key,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Validate an absolute http(s) URL and drop any trailing slash.
fn normalize_api_root(api_root: &str) -> Result<String, LibLynxError> {
    let invalid = || ConfigurationError::InvalidApiRoot {
        url: api_root.to_string(),
    };

    let parsed = url::Url::parse(api_root).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid().into());
    }

    Ok(api_root.trim_end_matches('/').to_string())
}

/// Create a configuration builder.
pub fn liblynx_config() -> LibLynxConfigBuilder {
    LibLynxConfigBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LibLynxConfigBuilder::new()
            .credentials("1_abc", "secret")
            .build()
            .unwrap();

        assert_eq!(config.api_root, "https://connect.liblynx.com");
        assert_eq!(config.token_endpoint(), "https://connect.liblynx.com/oauth/v2/token");
        assert_eq!(config.entrypoint_url(), "https://connect.liblynx.com/api");
        assert_eq!(config.auth_method, ClientAuthMethod::ClientSecretBasic);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.token_expiry_buffer, Duration::from_secs(60));
        assert_eq!(config.entrypoint_ttl, Duration::from_secs(86400));
        assert!(config.token_cache_key.is_none());
    }

    #[test]
    fn test_api_root_is_normalized() {
        let config = liblynx_config()
            .api_root("http://localhost:8080/")
            .credentials("1_abc", "secret")
            .build()
            .unwrap();
        assert_eq!(config.api_root, "http://localhost:8080");
        assert_eq!(config.entrypoint_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_missing_credentials() {
        let err = LibLynxConfigBuilder::new().build().unwrap_err();
        assert!(matches!(
            err,
            LibLynxError::Configuration(ConfigurationError::MissingCredentials)
        ));

        let err = LibLynxConfigBuilder::new()
            .client_id("1_abc")
            .client_secret("")
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_api_root() {
        for root in ["not a url", "ftp://example.com", "mailto:someone@example.com"] {
            let err = LibLynxConfigBuilder::new()
                .api_root(root)
                .credentials("1_abc", "secret")
                .build()
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    LibLynxError::Configuration(ConfigurationError::InvalidApiRoot { .. })
                ),
                "{root} accepted"
            );
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = LibLynxConfigBuilder::new()
            .credentials("1_abc", "secret")
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            LibLynxError::Configuration(ConfigurationError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_unusable_cache_key_rejected() {
        for id in ["bad id", "a/b", "tab\tid"] {
            let err = LibLynxConfigBuilder::new()
                .credentials(id, "secret")
                .build()
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    LibLynxError::Configuration(ConfigurationError::InvalidCacheKey { .. })
                ),
                "{id:?} accepted"
            );
        }

        let err = LibLynxConfigBuilder::new()
            .credentials("1_abc", "secret")
            .token_cache_key("my token")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            LibLynxError::Configuration(ConfigurationError::InvalidCacheKey { ref key, .. })
                if key == "my token"
        ));

        let config = LibLynxConfigBuilder::new()
            .credentials("1_abc", "secret")
            .token_cache_key("foo-bar")
            .build()
            .unwrap();
        assert_eq!(config.token_cache_key.as_deref(), Some("foo-bar"));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_CLIENT_ID, "9_fromenv");
        std::env::set_var(ENV_CLIENT_SECRET, "envsecret");
        std::env::set_var(ENV_API_ROOT, "http://127.0.0.1:9000");

        let config = LibLynxConfigBuilder::from_env().build().unwrap();
        assert_eq!(config.credentials.client_id, "9_fromenv");
        assert_eq!(config.credentials.secret(), "envsecret");
        assert_eq!(config.api_root, "http://127.0.0.1:9000");

        std::env::remove_var(ENV_CLIENT_ID);
        std::env::remove_var(ENV_CLIENT_SECRET);
        std::env::remove_var(ENV_API_ROOT);
    }
}
