//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Entries are written with `SET .. PXAT` so expiry is an absolute instant
/// enforced by the Redis server; reads never see an expired entry.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| DomainError::cache("Timed out connecting to Redis"))?
        .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    /// Creates a Redis cache with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisCacheConfig::new(url)).await
    }

    fn prefix_key(&self, key: &str) -> String {
        prefixed(self.config.key_prefix.as_deref(), key)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    DomainError::cache(format!(
                        "Failed to scan keys with pattern '{}': {}",
                        pattern, e
                    ))
                })?;

            found.extend(keys);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key),
        None => key.to_string(),
    }
}

/// Interprets a `PEXPIRETIME` reply: -2 means missing, -1 means no expiry
fn expiry_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis < 0 {
        return None;
    }

    Utc.timestamp_millis_opt(millis).single()
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<String> = conn.get(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to get key '{}': {}", key, e))
        })?;

        Ok(result)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        // Redis rejects non-positive PXAT values
        let at_millis = expires_at.timestamp_millis().max(1);

        redis::cmd("SET")
            .arg(&prefixed_key)
            .arg(value)
            .arg("PXAT")
            .arg(at_millis)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn.del(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to delete key '{}': {}", key, e))
        })?;

        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let exists: bool = conn.exists(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to check existence of key '{}': {}", key, e))
        })?;

        Ok(exists)
    }

    async fn expires_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let millis: i64 = redis::cmd("PEXPIRETIME")
            .arg(&prefixed_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache(format!("Failed to get expiry for key '{}': {}", key, e))
            })?;

        Ok(expiry_from_millis(millis))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        match &self.config.key_prefix {
            Some(_) => {
                let keys = self.scan(&self.prefix_key("*")).await?;

                if !keys.is_empty() {
                    let mut conn = self.connection.clone();
                    let _: i32 = conn.del(&keys).await.map_err(|e| {
                        DomainError::cache(format!("Failed to delete keys: {}", e))
                    })?;
                }
            }
            None => {
                let mut conn = self.connection.clone();
                redis::cmd("FLUSHDB")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| DomainError::cache(format!("Failed to flush database: {}", e)))?;
            }
        }

        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        match &self.config.key_prefix {
            Some(_) => Ok(self.scan(&self.prefix_key("*")).await?.len()),
            None => {
                let mut conn = self.connection.clone();
                let size: usize = redis::cmd("DBSIZE")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| {
                        DomainError::cache(format!("Failed to get database size: {}", e))
                    })?;
                Ok(size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    // These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("contacts-etag-test")
    }

    #[test]
    fn test_prefixed_key() {
        assert_eq!(
            prefixed(Some("app"), "contact-c1-AQI="),
            "app:contact-c1-AQI="
        );
        assert_eq!(prefixed(None, "contact-c1-AQI="), "contact-c1-AQI=");
    }

    #[test]
    fn test_expiry_from_millis() {
        assert_eq!(expiry_from_millis(-2), None);
        assert_eq!(expiry_from_millis(-1), None);

        let at = expiry_from_millis(1_709_283_600_000).unwrap();
        assert_eq!(at.timestamp(), 1_709_283_600);
    }

    #[test]
    fn test_config_builder() {
        let config = RedisCacheConfig::new("redis://localhost")
            .with_key_prefix("myapp")
            .with_connection_timeout(Duration::from_secs(1));

        assert_eq!(config.key_prefix, Some("myapp".to_string()));
        assert_eq!(config.connection_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        let expires_at = Utc::now() + chrono::Duration::minutes(30);

        cache.set("key1", &"value1", expires_at).await.unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        let stored_expiry = cache.expires_at("key1").await.unwrap().unwrap();
        assert_eq!(stored_expiry.timestamp_millis(), expires_at.timestamp_millis());

        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_past_expiry_is_absent() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("stale", &"value", Utc::now() - chrono::Duration::seconds(5))
            .await
            .unwrap();

        let result: Option<String> = cache.get("stale").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Utc::now() + chrono::Duration::minutes(1))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }
}
