//! Token Types
//!
//! Token endpoint response and the persisted token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token response from the token endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token persisted in the cache between requests and processes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Absolute expiry; `None` means the endpoint gave no lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create from a token response received at `now`.
    ///
    /// A lifetime too large to represent is treated as no lifetime.
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_at = response
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
            expires_at,
        }
    }

    /// True once `now + buffer` reaches the expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.expires_at.map_or(false, |exp| match now.checked_add_signed(buffer) {
            Some(deadline) => deadline >= exp,
            None => buffer > Duration::zero(),
        })
    }

    /// Check expiry against the current time.
    pub fn is_expired(&self, buffer: Duration) -> bool {
        self.is_expired_at(Utc::now(), buffer)
    }

    /// Value of the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}
