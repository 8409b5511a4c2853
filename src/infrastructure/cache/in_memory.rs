//! In-memory cache implementation using moka

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;
use moka::ops::compute::{CompResult, Op};
use tracing::debug;

use crate::domain::cache::Cache;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// How often the background sweeper drops expired entries
    pub sweep_interval: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl InMemoryCacheConfig {
    /// Sets the maximum capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Sets the sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    /// Absolute expiry
    expires_at: DateTime<Utc>,
}

/// Thread-safe in-memory cache implementation using moka
///
/// Expiry is absolute and judged against the injected clock, so an entry is
/// reported absent as soon as `clock.now()` passes its `expires_at`, whether
/// or not the sweeper has run yet.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    clock: Arc<dyn Clock>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache whose expiry is driven by `clock`
    pub fn with_clock(config: InMemoryCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
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
        self.clock.now() >= entry.expires_at
    }

    /// Drops every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;

        let now = self.clock.now();
        let cache_clone = self.cache.clone();
        let expired: Vec<String> = tokio::task::spawn_blocking(move || {
            cache_clone
                .iter()
                .filter(|(_, entry)| now >= entry.expires_at)
                .map(|(key, _)| key.as_ref().clone())
                .collect()
        })
        .await
        .map_err(|e| DomainError::cache(format!("Failed to iterate cache: {}", e)))?;

        let mut removed = 0;

        for key in &expired {
            // Re-check under the entry lock; a fresh write since the scan stays
            let entry = self
                .cache
                .entry_by_ref(key.as_str())
                .and_compute_with(|current| async move {
                    match current {
                        Some(entry) if now >= entry.value().expires_at => Op::Remove,
                        _ => Op::Nop,
                    }
                })
                .await;

            if matches!(entry, CompResult::Removed(_)) {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Runs `purge_expired` every `sweep_interval` until the runtime shuts down
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        let interval = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                match cache.purge_expired().await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "Swept expired cache entries"),
                    Err(e) => tracing::warn!(error = %e, "Cache sweep failed"),
                }
            }
        })
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            // Left for the sweeper
            Some(entry) if self.is_expired(&entry) => Ok(None),
            Some(entry) => Ok(Some(entry.data)),
            None => Ok(None),
        }
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    async fn expires_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) if self.is_expired(&entry) => Ok(None),
            Some(entry) => Ok(Some(entry.expires_at)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
