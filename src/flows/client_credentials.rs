//! Client Credentials Flow
//!
//! RFC 6749 Section 4.4 client credentials grant against
//! `{api_root}/oauth/v2/token`, plus the Section 6 refresh grant used when a
//! stored token carries a refresh token.

use base64::Engine;
use std::sync::Arc;

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{grant_error_from_response, AuthenticationError, LibLynxError};
use crate::types::{ClientAuthMethod, LibLynxConfig, TokenResponse};

/// Token endpoint client for the client credentials and refresh grants.
pub struct ClientCredentialsFlow {
    config: LibLynxConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ClientCredentialsFlow {
    /// Create new Client Credentials Flow.
    pub fn new(config: LibLynxConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Request a new access token with the client credentials.
    pub async fn request_token(&self) -> Result<TokenResponse, LibLynxError> {
        self.send(vec![("grant_type", "client_credentials".to_string())])
            .await
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, LibLynxError> {
        self.send(vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
        ])
        .await
    }

    fn build_request(&self, mut params: Vec<(&'static str, String)>) -> HttpRequest {
        let credentials = &self.config.credentials;
        let mut request = HttpRequest::new(HttpMethod::Post, self.config.token_endpoint())
            .header("content-type", "application/x-www-form-urlencoded")
            .header("accept", "application/json")
            .timeout(self.config.timeout);

        match self.config.auth_method {
            ClientAuthMethod::ClientSecretBasic => {
                let pair = format!("{}:{}", credentials.client_id, credentials.secret());
                let encoded = base64::engine::general_purpose::STANDARD.encode(pair);
                request = request.header("authorization", format!("Basic {encoded}"));
            }
            ClientAuthMethod::ClientSecretPost => {
                params.push(("client_id", credentials.client_id.clone()));
                params.push(("client_secret", credentials.secret().to_string()));
            }
        }

        // A list of string pairs always encodes.
        let body = serde_urlencoded::to_string(&params).unwrap_or_default();
        request.body(body)
    }

    async fn send(&self, params: Vec<(&'static str, String)>) -> Result<TokenResponse, LibLynxError> {
        let request = self.build_request(params);

        let response = self.transport.send(request).await.map_err(|e| {
            AuthenticationError::Network {
                message: e.to_string(),
            }
        })?;

        if !response.is_success() {
            return Err(grant_error_from_response(response.status, &response.body).into());
        }

        let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            AuthenticationError::InvalidTokenResponse {
                message: e.to_string(),
            }
        })?;

        if token.access_token.is_empty() {
            return Err(AuthenticationError::InvalidTokenResponse {
                message: "empty access_token".to_string(),
            }
            .into());
        }

        Ok(token)
    }
}
