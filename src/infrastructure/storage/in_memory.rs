//! In-memory contact repository

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::contact::{Contact, ContactId, ContactRepository};
use crate::domain::versioning::VersionToken;
use crate::domain::DomainError;

/// Thread-safe in-memory contact repository
///
/// Every write draws the next value of a store-wide counter as the contact's
/// row version, so tokens are never reused across contacts or updates.
/// Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryContactRepository {
    contacts: RwLock<HashMap<String, Contact>>,
    row_version: AtomicU64,
}

impl InMemoryContactRepository {
    /// Creates a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with contacts, each stamped with a
    /// fresh row version
    pub fn with_contacts(contacts: Vec<Contact>) -> Result<Self, DomainError> {
        let repository = Self::new();
        {
            let mut map = repository.contacts.write().map_err(|e| {
                DomainError::storage(format!("Failed to acquire write lock: {}", e))
            })?;

            for contact in contacts {
                let stamped = contact.with_row_version(repository.next_row_version());
                map.insert(stamped.id().as_str().to_string(), stamped);
            }
        }
        Ok(repository)
    }

    fn next_row_version(&self) -> VersionToken {
        VersionToken::from_sequence(self.row_version.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, DomainError> {
        let contacts = self.contacts.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(contacts.get(id.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<Contact>, DomainError> {
        let contacts = self.contacts.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut all: Vec<Contact> = contacts.values().cloned().collect();
        all.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        Ok(all)
    }

    async fn create(&self, contact: Contact) -> Result<Contact, DomainError> {
        let key = contact.id().as_str().to_string();
        let mut contacts = self.contacts.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if contacts.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Contact with id '{}' already exists",
                key
            )));
        }

        let stored = contact.with_row_version(self.next_row_version());
        contacts.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(&self, contact: Contact) -> Result<Contact, DomainError> {
        let key = contact.id().as_str().to_string();
        let mut contacts = self.contacts.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let Some(existing) = contacts.get(&key) else {
            return Err(DomainError::not_found(format!(
                "Contact with id '{}' not found",
                key
            )));
        };

        if !contact.row_version().is_empty() && contact.row_version() != existing.row_version() {
            return Err(DomainError::conflict(format!(
                "Contact with id '{}' was modified concurrently",
                key
            )));
        }

        let stored = contact.with_row_version(self.next_row_version());
        contacts.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &ContactId) -> Result<bool, DomainError> {
        let mut contacts = self.contacts.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(contacts.remove(id.as_str()).is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let contacts = self.contacts.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(contacts.len())
    }
}
