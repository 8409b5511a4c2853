//! Contacts ETag API
//!
//! Serves contacts over HTTP with conditional GETs:
//! - `If-None-Match` tokens resolved against a snapshot cache before the store
//! - Pluggable snapshot caches (in-memory, Redis)
//! - Pluggable contact stores (in-memory, PostgreSQL)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use config::{CacheBackend, StorageBackend};
use domain::{ConditionalCache, SystemClock};
use infrastructure::{
    cache::{CacheConfig, CacheFactory},
    services::ContactService,
    storage::{PostgresConfig, StorageConfig, StorageFactory},
};
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
///
/// With the in-memory cache backend this also starts the background sweeper
/// that drops expired snapshots.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = storage_config(config)?;
    info!("Storage backend: {:?}", storage_config.storage_type());
    let repository = StorageFactory::create_contacts(&storage_config).await?;

    let cache_config = cache_config(config)?;
    info!("Snapshot cache backend: {}", cache_config.cache_type);
    let cache_factory = CacheFactory::new();

    let cache: Arc<dyn domain::Cache> = match config.cache.backend {
        CacheBackend::InMemory => {
            let cache = cache_factory.create_in_memory(&cache_config);
            cache.spawn_sweeper();
            Arc::new(cache)
        }
        CacheBackend::Redis => cache_factory.create(&cache_config).await?,
    };

    let ttl = i64::try_from(config.cache.ttl_secs)
        .map(chrono::Duration::seconds)
        .map_err(|_| anyhow::anyhow!("cache.ttl_secs is out of range"))?;
    info!("Snapshot TTL: {}s", ttl.num_seconds());

    let conditional = ConditionalCache::new(cache.clone(), Arc::new(SystemClock)).with_ttl(ttl);
    let contact_service = ContactService::new(repository, conditional);

    if config.auth.user_keys.is_empty() {
        info!("No user keys configured; contact endpoints are open");
    }

    Ok(AppState::new(
        Arc::new(contact_service),
        cache,
        config.auth.user_keys.clone(),
    ))
}

fn storage_config(config: &AppConfig) -> anyhow::Result<StorageConfig> {
    match config.storage.backend {
        StorageBackend::InMemory => Ok(StorageConfig::in_memory()),
        StorageBackend::Postgres => {
            let url = config.storage.database_url.clone().ok_or_else(|| {
                anyhow::anyhow!("storage.database_url is required for PostgreSQL storage")
            })?;

            Ok(StorageConfig::postgres(
                PostgresConfig::new(url)
                    .with_max_connections(config.storage.max_connections)
                    .with_min_connections(config.storage.min_connections),
            ))
        }
    }
}

fn cache_config(config: &AppConfig) -> anyhow::Result<CacheConfig> {
    let mut cache_config = match config.cache.backend {
        CacheBackend::InMemory => CacheConfig::in_memory()
            .with_max_capacity(config.cache.max_capacity)
            .with_sweep_interval(Duration::from_secs(config.cache.sweep_interval_secs.max(1))),
        CacheBackend::Redis => {
            let url = config.cache.redis_url.clone().ok_or_else(|| {
                anyhow::anyhow!("cache.redis_url is required for the Redis cache")
            })?;
            CacheConfig::redis(url)
        }
    };

    if let Some(prefix) = &config.cache.key_prefix {
        cache_config = cache_config.with_key_prefix(prefix.clone());
    }

    Ok(cache_config)
}
