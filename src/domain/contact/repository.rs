//! Contact repository trait

use async_trait::async_trait;

use super::entity::{Contact, ContactId};
use crate::domain::conditional::VersionedStore;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistent store for contacts
///
/// Implementations own the contact's `row_version`: every successful
/// `create` and `update` stamps a new, never reused token on the stored
/// contact and returns it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Get a contact by ID
    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, DomainError>;

    /// List all contacts ordered by ID
    async fn list(&self) -> Result<Vec<Contact>, DomainError>;

    /// Create a new contact, failing with `Conflict` if the ID is taken
    async fn create(&self, contact: Contact) -> Result<Contact, DomainError>;

    /// Replace an existing contact, failing with `NotFound` if absent
    ///
    /// A non-empty `row_version` on `contact` is the version the caller
    /// expects to overwrite; a mismatch fails with `Conflict`.
    async fn update(&self, contact: Contact) -> Result<Contact, DomainError>;

    /// Delete a contact by ID
    async fn delete(&self, id: &ContactId) -> Result<bool, DomainError>;

    /// Count stored contacts
    async fn count(&self) -> Result<usize, DomainError>;
}

#[async_trait]
impl<R> VersionedStore<Contact> for R
where
    R: ContactRepository + ?Sized,
{
    async fn find_by_id(&self, id: &str) -> Result<Option<Contact>, DomainError> {
        // An ID that fails validation can never have been stored
        let Ok(contact_id) = ContactId::new(id) else {
            return Ok(None);
        };

        self.get(&contact_id).await
    }
}
