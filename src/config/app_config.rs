use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub storage: StorageSettings,
    pub auth: AuthConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    InMemory,
    Redis,
}

/// Snapshot cache settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    /// Snapshot lifetime, measured from the write
    pub ttl_secs: u64,
    pub max_capacity: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Accepted user keys; an empty list disables the check
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub user_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: None,
            key_prefix: None,
            ttl_secs: 1800,
            max_capacity: 10_000,
            sweep_interval_secs: 60,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: 10,
            min_connections: 1,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.user_keys")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Rejects combinations that can only fail at startup
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(config::ConfigError::Message(
                "cache.redis_url is required when cache.backend = redis".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none() {
            return Err(config::ConfigError::Message(
                "storage.database_url is required when storage.backend = postgres".to_string(),
            ));
        }

        if self.cache.ttl_secs == 0 {
            return Err(config::ConfigError::Message(
                "cache.ttl_secs must be greater than zero".to_string(),
            ));
        }

        if !self.metrics.path.starts_with('/') {
            return Err(config::ConfigError::Message(
                "metrics.path must start with '/'".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.backend, CacheBackend::InMemory);
        assert_eq!(config.cache.ttl_secs, 1800);
        assert_eq!(config.storage.backend, StorageBackend::InMemory);
        assert!(config.auth.user_keys.is_empty());
        assert!(config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "cache": { "backend": "redis", "redis_url": "redis://localhost" },
                 "auth": { "user_keys": ["k1"] } }"#,
        )
        .unwrap();

        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.ttl_secs, 1800);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.user_keys, vec!["k1".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_backend_urls() {
        let mut config = AppConfig::default();
        config.cache.backend = CacheBackend::Redis;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Postgres;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl_and_bad_metrics_path() {
        let mut config = AppConfig::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.metrics.path = "metrics".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
