//! LibLynx Client
//!
//! Authenticated, entry-point-resolved JSON requests against the LibLynx
//! Connect API and the identification workflow built on top of them.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::builders::LibLynxClientBuilder;
use crate::core::{
    Cache, DocumentFetcher, EntryPointConfig, EntryPointResolver, HttpMethod, HttpRequest,
    HttpResponse, HttpTransport,
};
use crate::error::{ApiError, ConfigurationError, LibLynxError, LibLynxResult};
use crate::resources::Identification;
use crate::telemetry::{LogContext, Logger};
use crate::token::OAuth2Authenticator;
use crate::types::{IdentificationRequest, LibLynxConfig};

/// Entry point accepting new identification requests.
pub const NEW_IDENTIFICATION: &str = "@new_identification";

/// Statuses whose JSON body describes a rejected payload rather than a fault.
const VALIDATION_STATUSES: [u16; 2] = [400, 422];

/// Sends authenticated requests and classifies the responses.
struct ApiRequester {
    api_root: String,
    timeout: Duration,
    transport: Arc<dyn HttpTransport>,
    authenticator: Arc<OAuth2Authenticator>,
    logger: Arc<dyn Logger>,
}

impl ApiRequester {
    async fn execute(
        &self,
        method: HttpMethod,
        entrypoint: &str,
        url: &str,
        body: Option<String>,
    ) -> LibLynxResult<HttpResponse> {
        let mut request = HttpRequest::new(method, url)
            .header("accept", "application/json")
            .timeout(self.timeout);
        if let Some(body) = body.filter(|body| !body.is_empty()) {
            request = request
                .header("content-type", "application/json")
                .body(body);
        }

        let context = LogContext::new()
            .operation("api_request")
            .method(method.as_str())
            .entrypoint(entrypoint)
            .url(url);
        self.logger
            .debug(&format!("API {method} {entrypoint}"), &context);

        let (authenticated, source) = self.authenticator.authenticate(request.clone()).await?;
        let response = self.send(authenticated, entrypoint, &context).await?;

        if response.status != 401 || source.is_fresh() {
            return Ok(response);
        }

        // A cached token was refused; it may have been revoked server side.
        self.logger.warn(
            "API rejected stored token, requesting a new one",
            &context.clone().status(401),
        );
        self.authenticator.invalidate().await?;
        let (authenticated, _) = self.authenticator.authenticate(request).await?;
        self.send(authenticated, entrypoint, &context).await
    }

    async fn send(
        &self,
        request: HttpRequest,
        entrypoint: &str,
        context: &LogContext,
    ) -> LibLynxResult<HttpResponse> {
        let method = request.method;
        self.transport.send(request).await.map_err(|e| {
            self.logger
                .error(&format!("API {method} {entrypoint} failed: {e}"), context);
            ApiError::Transport {
                method: method.to_string(),
                entrypoint: entrypoint.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Decode the response body; `accept_validation` lets 400/422 JSON bodies
    /// through as values.
    fn decode(
        &self,
        method: HttpMethod,
        entrypoint: &str,
        response: HttpResponse,
        accept_validation: bool,
    ) -> LibLynxResult<Value> {
        let context = LogContext::new()
            .operation("api_request")
            .method(method.as_str())
            .entrypoint(entrypoint)
            .status(response.status);

        if response.is_success() {
            if response.body.trim().is_empty() {
                self.logger.debug(
                    &format!("API {method} {entrypoint} succeeded ({}), empty body", response.status),
                    &context,
                );
                return Ok(Value::Null);
            }
            return match serde_json::from_str(&response.body) {
                Ok(value) => {
                    self.logger.debug(
                        &format!("API {method} {entrypoint} succeeded ({})", response.status),
                        &context,
                    );
                    Ok(value)
                }
                Err(e) => {
                    self.logger.error(
                        &format!("API {method} {entrypoint} returned invalid JSON"),
                        &context.extra("body", response.body.as_str()),
                    );
                    Err(ApiError::InvalidJson {
                        method: method.to_string(),
                        entrypoint: entrypoint.to_string(),
                        status: response.status,
                        message: e.to_string(),
                    }
                    .into())
                }
            };
        }

        if accept_validation && VALIDATION_STATUSES.contains(&response.status) {
            if let Ok(value) = serde_json::from_str::<Value>(&response.body) {
                self.logger.warn(
                    &format!("API {method} {entrypoint} rejected payload ({})", response.status),
                    &context.extra("body", response.body.as_str()),
                );
                return Ok(value);
            }
        }

        self.logger.error(
            &format!("API {method} {entrypoint} request failed ({})", response.status),
            &context.extra("body", response.body.as_str()),
        );
        Err(ApiError::Status {
            method: method.to_string(),
            entrypoint: entrypoint.to_string(),
            status: response.status,
            body: response.body,
        }
        .into())
    }

    /// Turn a relative reference into an absolute URL under the API root.
    fn absolute_url(&self, url: &str) -> LibLynxResult<String> {
        if url::Url::parse(url).is_ok() {
            return Ok(url.to_string());
        }

        let base = format!("{}/", self.api_root);
        url::Url::parse(&base)
            .and_then(|base| base.join(url))
            .map(String::from)
            .map_err(|e| {
                ConfigurationError::InvalidConfig {
                    message: format!("cannot resolve {url} against {}: {e}", self.api_root),
                }
                .into()
            })
    }
}

#[async_trait]
impl DocumentFetcher for ApiRequester {
    async fn fetch_document(&self, url: &str) -> Result<Value, LibLynxError> {
        let response = self.execute(HttpMethod::Get, url, url, None).await?;
        self.decode(HttpMethod::Get, url, response, false)
    }
}

/// LibLynx Connect API client.
///
/// Cheap to share behind an `Arc`; every operation takes `&self`.
pub struct LibLynxClient {
    config: LibLynxConfig,
    requester: Arc<ApiRequester>,
    authenticator: Arc<OAuth2Authenticator>,
    resolver: EntryPointResolver,
    logger: Arc<dyn Logger>,
}

impl LibLynxClient {
    /// Start building a client.
    pub fn builder() -> LibLynxClientBuilder {
        LibLynxClientBuilder::new()
    }

    pub(crate) fn from_parts(
        config: LibLynxConfig,
        cache: Arc<dyn Cache>,
        logger: Arc<dyn Logger>,
        api_transport: Arc<dyn HttpTransport>,
        oauth_transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let authenticator = Arc::new(OAuth2Authenticator::new(
            &config,
            oauth_transport,
            cache.clone(),
            logger.clone(),
        ));

        let requester = Arc::new(ApiRequester {
            api_root: config.api_root.clone(),
            timeout: config.timeout,
            transport: api_transport,
            authenticator: authenticator.clone(),
            logger: logger.clone(),
        });

        let resolver = EntryPointResolver::new(
            EntryPointConfig {
                root_url: config.entrypoint_url(),
                client_id: config.credentials.client_id.clone(),
                ttl: config.entrypoint_ttl,
            },
            cache,
            requester.clone(),
            logger.clone(),
        );

        Self {
            config,
            requester,
            authenticator,
            resolver,
            logger,
        }
    }

    pub fn config(&self) -> &LibLynxConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &OAuth2Authenticator {
        &self.authenticator
    }

    pub fn resolver(&self) -> &EntryPointResolver {
        &self.resolver
    }

    /// Resolve an entry point name; URLs are returned unchanged.
    pub async fn resolve(&self, name_or_url: &str) -> LibLynxResult<String> {
        self.resolver.resolve(name_or_url).await
    }

    /// Resolve a symbolic entry point name such as `@new_identification`.
    pub async fn entry_point(&self, name: &str) -> LibLynxResult<String> {
        self.resolver.entry_point(name).await
    }

    /// GET an entry point or URL.
    pub async fn get(&self, entrypoint: &str) -> LibLynxResult<Value> {
        self.request(HttpMethod::Get, entrypoint, None).await
    }

    /// POST a JSON body to an entry point or URL.
    pub async fn post(&self, entrypoint: &str, json: impl Into<String>) -> LibLynxResult<Value> {
        self.request(HttpMethod::Post, entrypoint, Some(json.into()))
            .await
    }

    /// PUT a JSON body to an entry point or URL.
    pub async fn put(&self, entrypoint: &str, json: impl Into<String>) -> LibLynxResult<Value> {
        self.request(HttpMethod::Put, entrypoint, Some(json.into()))
            .await
    }

    /// Send a request and return the decoded JSON response.
    ///
    /// 400 and 422 responses with a JSON body are returned as values so that
    /// callers can inspect validation errors.
    pub async fn request(
        &self,
        method: HttpMethod,
        entrypoint: &str,
        body: Option<String>,
    ) -> LibLynxResult<Value> {
        let resolved = self.resolver.resolve(entrypoint).await?;
        let url = self.requester.absolute_url(&resolved)?;
        let response = self.requester.execute(method, entrypoint, &url, body).await?;
        self.requester.decode(method, entrypoint, response, true)
    }

    /// Identify a visitor.
    ///
    /// Returns `None` when the API does not produce an identification, for
    /// example because the payload failed validation.
    pub async fn authorize(
        &self,
        request: &IdentificationRequest,
    ) -> LibLynxResult<Option<Identification>> {
        let payload = request.to_json();
        let context = LogContext::new()
            .operation("authorize")
            .client_id(&self.config.credentials.client_id);

        if !request.is_well_formed() {
            self.logger.warn(
                "identification request lacks ip or url",
                &context.clone().extra("payload", payload.as_str()),
            );
        }

        let response = self.post(NEW_IDENTIFICATION, payload.as_str()).await?;

        let identification = match Identification::from_value(response.clone()) {
            Ok(identification) => identification,
            Err(_) => {
                self.logger.error(
                    "Identification request failed",
                    &context
                        .extra("payload", payload)
                        .extra("response", response.to_string()),
                );
                return Ok(None);
            }
        };

        let mut context = context
            .extra("id", identification.id())
            .extra("status", identification.status().as_str());
        if let Some(ip) = identification.ip() {
            context = context.extra("ip", ip);
        }
        if let Some(url) = identification.url() {
            context = context.extra("url", url);
        }
        self.logger.info(
            &format!(
                "Identification request for ip {} on URL {} succeeded status={} id={}",
                identification.ip().unwrap_or("-"),
                identification.url().unwrap_or("-"),
                identification.status(),
                identification.id()
            ),
            &context,
        );

        Ok(Some(identification))
    }
}

/// Create a client builder.
pub fn liblynx_client() -> LibLynxClientBuilder {
    LibLynxClientBuilder::new()
}
