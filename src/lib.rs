//! LibLynx Connect
//!
//! Client for the LibLynx Connect identification API.
//!
//! # Features
//!
//! - OAuth2 client credentials grant with refresh (RFC 6749 Sections 4.4, 6)
//! - Token persistence in a pluggable, shareable cache
//! - Entry point discovery through the HAL root document, cached for 24 hours
//! - Authenticated GET/POST/PUT with JSON decoding
//! - Visitor identification with WAYF handling
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use liblynx_connect::{liblynx_config, InMemoryCache, IdentificationRequest, LibLynxClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = liblynx_config()
//!         .credentials("1_abc", "secret")
//!         .build()?;
//!
//!     let client = LibLynxClient::builder()
//!         .config(config)
//!         .cache(Arc::new(InMemoryCache::new()))
//!         .build()?;
//!
//!     let request = IdentificationRequest::new()
//!         .ip("1.2.3.4")
//!         .url("http://www.example.com");
//!
//!     match client.authorize(&request).await? {
//!         Some(id) if id.is_identified() => {
//!             println!("identified as {}", id.account_name().unwrap_or("?"));
//!         }
//!         Some(id) if id.requires_wayf() => println!("redirect to {}", id.wayf_url()?),
//!         Some(_) => println!("not identified"),
//!         None => println!("identification failed"),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, token, HAL link and request types
//! - `error`: error hierarchy split by failure class
//! - `core`: HTTP transport, cache adapter, entry point resolution
//! - `flows`: token endpoint grants
//! - `token`: token storage and the bearer authenticator
//! - `resources`: HAL resources returned by the API
//! - `builders`: fluent builders for configuration and client
//! - `telemetry`: injected diagnostic logging
//! - `client`: the API client and the identification workflow

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod resources;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{liblynx_client, LibLynxClient, NEW_IDENTIFICATION};

// Re-export builders
pub use builders::{liblynx_config, LibLynxClientBuilder, LibLynxConfigBuilder};

// Re-export errors
pub use error::{
    ApiError, AuthenticationError, ConfigurationError, ErrorKind, LibLynxError, LibLynxResult,
    LogicError, StorageError, TransportError,
};

// Re-export types
pub use types::{
    CachedToken, ClientAuthMethod, ClientCredentials, EntryPointDocument, IdentificationRequest,
    LibLynxConfig, Link, Links, TokenResponse,
};

// Re-export resources
pub use resources::{Account, HalResource, Identification, IdentificationStatus};

// Re-export core components
pub use crate::core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // Cache
    Cache, InMemoryCache,
    // Entry points
    DocumentFetcher, EntryPointResolver,
};

// Re-export token management
pub use token::{OAuth2Authenticator, TokenSource, TokenStore};

// Re-export telemetry
pub use telemetry::{InMemoryLogger, LogContext, LogLevel, Logger, NoOpLogger, TracingLogger};
