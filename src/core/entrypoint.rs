//! Entry Point Resolution
//!
//! Symbolic entry point names (`@new_identification`) are translated to URLs
//! through the link relations of the API root document. The document is
//! looked up in memory, then in the persistent cache under
//! `entrypoint:{client_id}`, and only then fetched from the API.
//!
//! Concurrent first use may fetch the document more than once; the fetch is
//! idempotent so no de-duplication is attempted.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::core::Cache;
use crate::error::{ApiError, LibLynxError, LogicError};
use crate::telemetry::{LogContext, Logger};
use crate::types::EntryPointDocument;

/// Prefix of the entry point cache key.
pub const ENTRYPOINT_KEY_PREFIX: &str = "entrypoint";

/// Fetches the root document with an authenticated GET.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_document(&self, url: &str) -> Result<Value, LibLynxError>;
}

/// True for `@name` references; anything else is treated as a URL.
pub fn is_symbolic(name_or_url: &str) -> bool {
    name_or_url.starts_with('@')
}

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct EntryPointConfig {
    /// URL of the root document.
    pub root_url: String,
    /// Client whose document is cached.
    pub client_id: String,
    /// Lifetime of the persisted document.
    pub ttl: Duration,
}

/// Resolves symbolic entry points to URLs.
pub struct EntryPointResolver {
    config: EntryPointConfig,
    cache_key: String,
    cache: Arc<dyn Cache>,
    fetcher: Arc<dyn DocumentFetcher>,
    logger: Arc<dyn Logger>,
    document: RwLock<Option<Arc<EntryPointDocument>>>,
}

impl EntryPointResolver {
    pub fn new(
        config: EntryPointConfig,
        cache: Arc<dyn Cache>,
        fetcher: Arc<dyn DocumentFetcher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let cache_key = format!("{ENTRYPOINT_KEY_PREFIX}:{}", config.client_id);
        Self {
            config,
            cache_key,
            cache,
            fetcher,
            logger,
            document: RwLock::new(None),
        }
    }

    /// Cache key of the persisted document.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Resolve a symbolic name; URLs are returned unchanged without touching
    /// the cache or the network.
    pub async fn resolve(&self, name_or_url: &str) -> Result<String, LibLynxError> {
        if !is_symbolic(name_or_url) {
            return Ok(name_or_url.to_string());
        }

        let resolved = self.lookup(name_or_url).await?;
        self.logger.debug(
            &format!("Entrypoint {name_or_url} resolves to {resolved}"),
            &LogContext::new()
                .operation("resolve_entrypoint")
                .entrypoint(name_or_url)
                .url(&resolved),
        );
        Ok(resolved)
    }

    /// Resolve a name that must be symbolic.
    pub async fn entry_point(&self, name: &str) -> Result<String, LibLynxError> {
        if !is_symbolic(name) {
            return Err(LogicError::NotSymbolic {
                value: name.to_string(),
            }
            .into());
        }
        self.resolve(name).await
    }

    /// The entry point document, loading it if necessary.
    pub async fn document(&self) -> Result<Arc<EntryPointDocument>, LibLynxError> {
        if let Some(document) = self.document.read().await.as_ref() {
            self.logger.debug(
                "using previously loaded entrypoint",
                &self.context(),
            );
            return Ok(document.clone());
        }

        let document = Arc::new(self.load().await?);
        // A document without links is served once and never retained.
        if !document.links.is_empty() {
            *self.document.write().await = Some(document.clone());
        }
        Ok(document)
    }

    /// True once the document is held in memory.
    pub async fn is_loaded(&self) -> bool {
        self.document.read().await.is_some()
    }

    /// Drop the in-memory and persisted document.
    pub async fn clear(&self) -> Result<(), LibLynxError> {
        *self.document.write().await = None;
        self.cache.delete(&self.cache_key).await?;
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<String, LibLynxError> {
        let document = self.document().await?;
        document
            .href(name)
            .map(str::to_string)
            .ok_or_else(|| {
                LogicError::UnknownEntryPoint {
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn load(&self) -> Result<EntryPointDocument, LibLynxError> {
        if let Some(value) = self.cache.get(&self.cache_key).await? {
            match serde_json::from_value::<EntryPointDocument>(value) {
                Ok(document) => {
                    self.logger
                        .debug("loading entrypoint from persistent cache", &self.context());
                    return Ok(document);
                }
                Err(e) => {
                    self.logger.warn(
                        &format!("discarding unreadable cached entrypoint: {e}"),
                        &self.context(),
                    );
                }
            }
        }

        self.logger
            .debug("entrypoint not cached, requesting from API", &self.context());
        let value = self.fetcher.fetch_document(&self.config.root_url).await?;

        let document: EntryPointDocument =
            serde_json::from_value(value.clone()).map_err(|e| ApiError::InvalidJson {
                method: "GET".to_string(),
                entrypoint: self.config.root_url.clone(),
                status: 200,
                message: e.to_string(),
            })?;

        if document.links.is_empty() {
            self.logger
                .warn("entrypoint document has no links, not caching", &self.context());
            return Ok(document);
        }

        self.cache
            .set(&self.cache_key, value, Some(self.config.ttl))
            .await?;
        self.logger
            .info("entrypoint loaded from API and cached", &self.context());
        Ok(document)
    }

    fn context(&self) -> LogContext {
        LogContext::new()
            .operation("load_entrypoint")
            .url(&self.config.root_url)
            .client_id(&self.config.client_id)
    }
}
