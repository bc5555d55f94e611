//! Configuration Types
//!
//! Client configuration and OAuth2 client credentials.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production API root.
pub const DEFAULT_API_ROOT: &str = "https://connect.liblynx.com";

/// Path of the OAuth2 token endpoint, relative to the API root.
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth/v2/token";

/// Path of the entry point document, relative to the API root.
pub const ENTRYPOINT_PATH: &str = "/api";

/// Lifetime of the persisted entry point document (24 hours).
pub const DEFAULT_ENTRYPOINT_TTL: Duration = Duration::from_secs(86400);

/// LibLynx client configuration.
#[derive(Clone, Debug)]
pub struct LibLynxConfig {
    /// API root, without trailing slash.
    pub api_root: String,
    /// OAuth2 client credentials.
    pub credentials: ClientCredentials,
    /// How credentials are presented to the token endpoint.
    pub auth_method: ClientAuthMethod,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Tokens expiring within this window are treated as expired.
    pub token_expiry_buffer: Duration,
    /// TTL of the persisted entry point document.
    pub entrypoint_ttl: Duration,
    /// Overrides the default `oauth2-token:{client_id}` cache key.
    pub token_cache_key: Option<String>,
}

impl LibLynxConfig {
    /// URL of the OAuth2 token endpoint.
    pub fn token_endpoint(&self) -> String {
        format!("{}{}", self.api_root, TOKEN_ENDPOINT_PATH)
    }

    /// URL of the entry point document.
    pub fn entrypoint_url(&self) -> String {
        format!("{}{}", self.api_root, ENTRYPOINT_PATH)
    }
}

/// OAuth2 client credentials issued by LibLynx.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
}

impl ClientCredentials {
    /// Create credentials from an id/secret pair.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    /// Expose the secret for building a token request.
    pub fn secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Client authentication method at the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// HTTP Basic authentication header.
    #[default]
    ClientSecretBasic,
    /// `client_id` and `client_secret` in the form body.
    ClientSecretPost,
}
