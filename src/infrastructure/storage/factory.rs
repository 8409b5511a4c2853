//! Storage factory for runtime repository selection

use std::sync::Arc;

use crate::domain::contact::ContactRepository;
use crate::domain::DomainError;

use super::in_memory::InMemoryContactRepository;
use super::postgres::{PostgresConfig, PostgresContactRepository};

/// Default table holding contacts
pub const CONTACTS_TABLE: &str = "contacts";

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl std::str::FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(DomainError::configuration(format!(
                "Unknown storage type: {}. Valid types: in_memory, postgres",
                s
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating contact repositories
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a contact repository based on the configuration
    pub async fn create_contacts(
        config: &StorageConfig,
    ) -> Result<Arc<dyn ContactRepository>, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryContactRepository::new())),
            StorageConfig::Postgres(pg_config) => {
                let repository =
                    PostgresContactRepository::connect(pg_config, CONTACTS_TABLE).await?;
                repository.ensure_table().await?;
                Ok(Arc::new(repository))
            }
        }
    }
}
