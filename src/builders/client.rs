//! Client Builder
//!
//! Wires configuration, cache, logger and transports into a [`LibLynxClient`].

use std::sync::Arc;

use crate::client::LibLynxClient;
use crate::core::{Cache, HttpTransport, ReqwestHttpTransport, DEFAULT_MAX_RESPONSE_SIZE};
use crate::error::{ConfigurationError, LibLynxError};
use crate::telemetry::{Logger, TracingLogger};
use crate::types::LibLynxConfig;

/// LibLynx client builder.
///
/// A configuration and a cache are required. The logger defaults to
/// [`TracingLogger`]; both transports default to reqwest with the configured
/// timeout.
#[derive(Default)]
pub struct LibLynxClientBuilder {
    config: Option<LibLynxConfig>,
    cache: Option<Arc<dyn Cache>>,
    logger: Option<Arc<dyn Logger>>,
    api_transport: Option<Arc<dyn HttpTransport>>,
    oauth_transport: Option<Arc<dyn HttpTransport>>,
}

impl LibLynxClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: LibLynxConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Cache shared by the token store and the entry point resolver.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Transport for API requests.
    pub fn api_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.api_transport = Some(transport);
        self
    }

    /// Transport for the token endpoint.
    pub fn oauth_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.oauth_transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<LibLynxClient, LibLynxError> {
        let config = self.config.ok_or(ConfigurationError::MissingCredentials)?;
        let cache = self.cache.ok_or(ConfigurationError::MissingCache)?;
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::new()));

        let api_transport = match self.api_transport {
            Some(transport) => transport,
            None => default_transport(&config)?,
        };
        let oauth_transport = match self.oauth_transport {
            Some(transport) => transport,
            None => default_transport(&config)?,
        };

        Ok(LibLynxClient::from_parts(
            config,
            cache,
            logger,
            api_transport,
            oauth_transport,
        ))
    }
}

fn default_transport(config: &LibLynxConfig) -> Result<Arc<dyn HttpTransport>, LibLynxError> {
    Ok(Arc::new(ReqwestHttpTransport::with_options(
        config.timeout,
        DEFAULT_MAX_RESPONSE_SIZE,
    )?))
}
