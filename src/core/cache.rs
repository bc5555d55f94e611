//! Cache Adapter
//!
//! Key/value store with per-entry TTL shared by the token store and the
//! entry point resolver. Both write under distinct key prefixes, so a single
//! instance can back several clients, and in a shared backend several
//! processes.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{ConfigurationError, LibLynxError};

/// Longest key accepted by [`validate_key`].
pub const MAX_KEY_LENGTH: usize = 250;

/// Cache interface.
///
/// Implementations own their concurrency safety. A malformed key must be
/// reported as [`ConfigurationError::InvalidCacheKey`]; backend failures as
/// [`crate::error::StorageError`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    /// Check whether a live entry exists.
    async fn has(&self, key: &str) -> Result<bool, LibLynxError>;

    /// Retrieve a live entry.
    async fn get(&self, key: &str) -> Result<Option<Value>, LibLynxError>;

    /// Store an entry; `None` keeps it until deleted.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>)
        -> Result<(), LibLynxError>;

    /// Delete an entry, returning whether one existed.
    async fn delete(&self, key: &str) -> Result<bool, LibLynxError>;
}

/// Reject keys that no reasonable backend can store.
pub fn validate_key(key: &str) -> Result<(), LibLynxError> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key.len() > MAX_KEY_LENGTH {
        Some("key is too long")
    } else if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("key contains whitespace or control characters")
    } else if key.chars().any(|c| matches!(c, '{' | '}' | '(' | ')' | '/' | '\\')) {
        Some("key contains a reserved character")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigurationError::InvalidCacheKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |exp| now < exp)
    }
}

/// In-memory cache, suitable for a single process and for tests.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    /// Create new in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live_value(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn has(&self, key: &str) -> Result<bool, LibLynxError> {
        validate_key(key)?;
        Ok(self.live_value(key).is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, LibLynxError> {
        validate_key(key)?;
        Ok(self.live_value(key))
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), LibLynxError> {
        validate_key(key)?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.lock()
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, LibLynxError> {
        validate_key(key)?;
        Ok(self.lock().remove(key).is_some())
    }
}
