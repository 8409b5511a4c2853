//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, CacheBackend, CacheSettings, LogFormat, LoggingConfig, MetricsConfig,
    ServerConfig, StorageBackend, StorageSettings,
};
