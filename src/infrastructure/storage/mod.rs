//! Storage infrastructure - Contact repository implementations

mod factory;
mod in_memory;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType, CONTACTS_TABLE};
pub use in_memory::InMemoryContactRepository;
pub use postgres::{PostgresConfig, PostgresContactRepository};
