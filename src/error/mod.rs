//! LibLynx Error Types
//!
//! Error hierarchy split by failure class so callers can match on the kind of
//! failure instead of inspecting messages:
//!
//! - [`ConfigurationError`] and [`LogicError`]: caller-fixable integration
//!   problems. Never retried.
//! - [`AuthenticationError`]: the token endpoint could not issue a token.
//! - [`ApiError`]: the identification API itself failed after authentication.
//! - [`StorageError`]: the cache backend failed to read or write.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the LibLynx Connect client.
#[derive(Error, Debug)]
pub enum LibLynxError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Logic error: {0}")]
    Logic(#[from] LogicError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Coarse classification of a [`LibLynxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Logic,
    Authentication,
    Api,
    Storage,
}

impl LibLynxError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "LIBLYNX_CONFIG",
            Self::Logic(_) => "LIBLYNX_LOGIC",
            Self::Authentication(_) => "LIBLYNX_AUTH",
            Self::Api(_) => "LIBLYNX_API",
            Self::Storage(_) => "LIBLYNX_STORAGE",
        }
    }

    /// Failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Logic(_) => ErrorKind::Logic,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Api(_) => ErrorKind::Api,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// True for errors the integrator has to fix (configuration or logic).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Logic(_))
    }

    /// Upstream HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(ApiError::Status { status, .. }) => Some(*status),
            Self::Api(ApiError::InvalidJson { status, .. }) => Some(*status),
            Self::Authentication(AuthenticationError::GrantRejected { status, .. }) => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Client credentials are required before making API calls")]
    MissingCredentials,

    #[error("A cache implementation is required")]
    MissingCache,

    #[error("Invalid API root URL: {url}")]
    InvalidApiRoot { url: String },

    #[error("Invalid cache key {key:?}: {reason}")]
    InvalidCacheKey { key: String, reason: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Misuse of the API surface or a contract mismatch with the server.
#[derive(Error, Debug)]
pub enum LogicError {
    #[error("Invalid LibLynx API entrypoint {name} requested")]
    UnknownEntryPoint { name: String },

    #[error("Resource did not contain a {relation} link")]
    MissingLink { relation: String },

    #[error("No value called {name}")]
    UndeclaredField { name: String },

    #[error("{value} is not a symbolic entrypoint name")]
    NotSymbolic { value: String },
}

/// Token acquisition error.
#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("Token request failed: {message}")]
    Network { message: String },

    #[error("Token endpoint returned {status}: {body}")]
    GrantRejected {
        status: u16,
        body: String,
        error: Option<String>,
        error_description: Option<String>,
    },

    #[error("Invalid token response: {message}")]
    InvalidTokenResponse { message: String },
}

/// Failure of an authenticated API request.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{method} {entrypoint} failed: {message}")]
    Transport {
        method: String,
        entrypoint: String,
        message: String,
    },

    #[error("{method} {entrypoint} request failed ({status})")]
    Status {
        method: String,
        entrypoint: String,
        status: u16,
        body: String,
    },

    #[error("{method} {entrypoint} returned invalid JSON: {message}")]
    InvalidJson {
        method: String,
        entrypoint: String,
        status: u16,
        message: String,
    },
}

/// Cache backend error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },
}

/// Failure of a single HTTP exchange, before any status interpretation.
///
/// The client maps it into [`AuthenticationError`] or [`ApiError`] depending
/// on which hop failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },
}

/// Result type for LibLynx operations.
pub type LibLynxResult<T> = Result<T, LibLynxError>;

/// OAuth2 error body returned by the token endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Parse an OAuth2 error body, if the endpoint sent one.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Build an authentication error from a non-success token endpoint response.
pub fn grant_error_from_response(status: u16, body: &str) -> AuthenticationError {
    let parsed = parse_error_response(body);
    AuthenticationError::GrantRejected {
        status,
        body: body.to_string(),
        error: parsed.as_ref().map(|r| r.error.clone()),
        error_description: parsed.and_then(|r| r.error_description),
    }
}
