//! PostgreSQL contact repository with connection pooling

use std::fmt::Debug;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::contact::{Contact, ContactId, ContactRepository};
use crate::domain::versioning::VersionToken;
use crate::domain::DomainError;

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/contacts".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }
}

/// PostgreSQL contact repository
///
/// Stores each contact as JSONB next to a `row_version` column that is drawn
/// from a dedicated sequence on every insert and update.
pub struct PostgresContactRepository {
    pool: PgPool,
    table_name: String,
}

impl Debug for PostgresContactRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresContactRepository")
            .field("table_name", &self.table_name)
            .finish()
    }
}

/// Maps a store-issued token back to the sequence value it was built from
fn sequence_of(token: &VersionToken) -> Option<i64> {
    let bytes: [u8; 8] = token.as_bytes().try_into().ok()?;
    i64::try_from(u64::from_be_bytes(bytes)).ok()
}

impl PostgresContactRepository {
    /// Creates a repository over an existing pool
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
        }
    }

    /// Creates a repository with its own connection pool
    pub async fn connect(
        config: &PostgresConfig,
        table_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool, table_name))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn sequence_name(&self) -> String {
        format!("{}_row_version_seq", self.table_name)
    }

    /// Ensures the contacts table and its row version sequence exist
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let statements = [
            format!("CREATE SEQUENCE IF NOT EXISTS {}", self.sequence_name()),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id VARCHAR(64) PRIMARY KEY,
                    data JSONB NOT NULL,
                    row_version BIGINT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
                self.table_name
            ),
        ];

        for statement in &statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;
        }

        Ok(())
    }

    fn contact_from_row(row: &PgRow) -> Result<Contact, DomainError> {
        let data: serde_json::Value = row.get("data");
        let row_version: i64 = row.get("row_version");

        let contact: Contact = serde_json::from_value(data).map_err(|e| {
            DomainError::storage(format!("Failed to deserialize contact: {}", e))
        })?;

        Ok(contact.with_row_version(VersionToken::from_sequence(row_version as u64)))
    }

    fn contact_data(contact: &Contact) -> Result<serde_json::Value, DomainError> {
        // The row version lives in its own column
        let mut data = serde_json::to_value(contact).map_err(|e| {
            DomainError::storage(format!("Failed to serialize contact: {}", e))
        })?;

        if let Some(object) = data.as_object_mut() {
            object.remove("rowVersion");
        }

        Ok(data)
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, DomainError> {
        let query = format!(
            "SELECT data, row_version FROM {} WHERE id = $1",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get contact: {}", e)))?;

        result.as_ref().map(Self::contact_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Contact>, DomainError> {
        let query = format!(
            "SELECT data, row_version FROM {} ORDER BY id",
            self.table_name
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list contacts: {}", e)))?;

        rows.iter().map(Self::contact_from_row).collect()
    }

    async fn create(&self, contact: Contact) -> Result<Contact, DomainError> {
        let id = contact.id().as_str().to_string();
        let data = Self::contact_data(&contact)?;

        let query = format!(
            r#"
            INSERT INTO {} (id, data, row_version)
            VALUES ($1, $2, nextval('{}'))
            RETURNING row_version
            "#,
            self.table_name,
            self.sequence_name()
        );

        let row = sqlx::query(&query)
            .bind(&id)
            .bind(&data)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DomainError::conflict(format!("Contact with id '{}' already exists", id))
                }
                _ => DomainError::storage(format!("Failed to create contact: {}", e)),
            })?;

        let row_version: i64 = row.get("row_version");
        Ok(contact.with_row_version(VersionToken::from_sequence(row_version as u64)))
    }

    async fn update(&self, contact: Contact) -> Result<Contact, DomainError> {
        let id = contact.id().as_str().to_string();
        let data = Self::contact_data(&contact)?;

        let expected = if contact.row_version().is_empty() {
            None
        } else {
            // A token this store never issued cannot match any row
            Some(sequence_of(contact.row_version()).unwrap_or(-1))
        };

        let query = format!(
            r#"
            UPDATE {}
            SET data = $2, row_version = nextval('{}'), updated_at = NOW()
            WHERE id = $1 AND ($3::BIGINT IS NULL OR row_version = $3)
            RETURNING row_version
            "#,
            self.table_name,
            self.sequence_name()
        );

        let row = sqlx::query(&query)
            .bind(&id)
            .bind(&data)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update contact: {}", e)))?;

        match row {
            Some(row) => {
                let row_version: i64 = row.get("row_version");
                Ok(contact.with_row_version(VersionToken::from_sequence(row_version as u64)))
            }
            None if expected.is_some() && self.get(contact.id()).await?.is_some() => {
                Err(DomainError::conflict(format!(
                    "Contact with id '{}' was modified concurrently",
                    id
                )))
            }
            None => Err(DomainError::not_found(format!(
                "Contact with id '{}' not found",
                id
            ))),
        }
    }

    async fn delete(&self, id: &ContactId) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table_name);

        let result = sqlx::query(&query)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete contact: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let query = format!("SELECT COUNT(*) as count FROM {}", self.table_name);

        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count contacts: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}
