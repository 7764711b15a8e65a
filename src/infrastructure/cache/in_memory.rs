//! In-memory cache implementation using moka

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::ops::compute::{CompResult, Op};

use crate::domain::cache::{Cache, Clock, SystemClock};
use crate::domain::FetchError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper bound on how long moka keeps any entry around; per-entry TTLs
    /// are enforced separately against the injected clock
    pub max_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_ttl: Duration::from_secs(3600),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    /// Expiration timestamp (millis since epoch, per the injected clock)
    expires_at: u64,
}

/// Thread-safe in-memory cache
///
/// Each insert replaces the whole entry for its key. Expired entries are
/// treated as absent and dropped on the lookup that finds them.
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    clock: Arc<dyn Clock>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: InMemoryCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.max_ttl)
            .build();

        Self {
            cache,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.clock.now_millis() > entry.expires_at
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, FetchError> {
        let Some(entry) = self.cache.get(key).await else {
            return Ok(None);
        };

        if !self.is_expired(&entry) {
            return Ok(Some(entry.data));
        }

        // A writer may have replaced the entry since the read above; only
        // remove what is still expired, atomically per key
        let now = self.clock.now_millis();
        let result = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(current) if now > current.value().expires_at => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::Unchanged(current) => Ok(Some(current.into_value().data)),
            _ => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), FetchError> {
        let expires_at = self.clock.now_millis() + ttl.as_millis() as u64;
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, FetchError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn clear(&self) -> Result<(), FetchError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, FetchError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
