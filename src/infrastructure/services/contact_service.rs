//! Contact service - CRUD operations and conditional reads for contacts

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{
    CacheKeyPrefix, ConditionalCache, Contact, ContactId, ContactRepository, DomainError,
    EncodedVersionToken, Resolution, VersionToken,
};

/// Resource name used in snapshot cache keys
pub const CONTACT_RESOURCE: &str = "contact";

/// Request to create a new contact
#[derive(Debug, Clone)]
pub struct CreateContactRequest {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_family_member: bool,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub anniversary_date: Option<NaiveDate>,
}

/// Request to update an existing contact; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_family_member: Option<bool>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub anniversary_date: Option<NaiveDate>,
}

/// Contact service for CRUD operations and ETag-aware reads
pub struct ContactService {
    repository: Arc<dyn ContactRepository>,
    conditional: ConditionalCache,
}

impl fmt::Debug for ContactService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactService")
            .field("repository", &"<ContactRepository>")
            .field("conditional", &self.conditional)
            .finish()
    }
}

impl ContactService {
    /// Create a new ContactService over the given repository and cache front
    pub fn new(repository: Arc<dyn ContactRepository>, conditional: ConditionalCache) -> Self {
        Self {
            repository,
            conditional,
        }
    }

    pub fn repository(&self) -> &Arc<dyn ContactRepository> {
        &self.repository
    }

    pub fn conditional(&self) -> &ConditionalCache {
        &self.conditional
    }

    /// Resolve a contact against the version the client last saw
    ///
    /// Fails with `InvalidId` for a malformed ID and `NotFound` when the
    /// contact exists neither in the snapshot cache nor in the repository.
    pub async fn get_conditional(
        &self,
        id: &str,
        caller_token: Option<&EncodedVersionToken>,
    ) -> Result<Resolution<Contact>, DomainError> {
        let contact_id = ContactId::new(id)?;
        let prefix = CacheKeyPrefix::new(CONTACT_RESOURCE, contact_id.as_str());

        self.conditional
            .resolve(&prefix, caller_token, self.repository.as_ref())
            .await
    }

    /// Get a contact by ID
    pub async fn get(&self, id: &str) -> Result<Option<Contact>, DomainError> {
        let contact_id = ContactId::new(id)?;
        self.repository.get(&contact_id).await
    }

    /// List all contacts
    pub async fn list(&self) -> Result<Vec<Contact>, DomainError> {
        self.repository.list().await
    }

    /// Create a new contact
    pub async fn create(&self, request: CreateContactRequest) -> Result<Contact, DomainError> {
        let contact_id = ContactId::new(request.id)?;

        let mut contact = Contact::new(contact_id, request.first_name, request.last_name)?
            .with_family_member(request.is_family_member);

        if let Some(company) = request.company {
            contact = contact.with_company(company);
        }

        if let Some(job_title) = request.job_title {
            contact = contact.with_job_title(job_title);
        }

        if let Some(email) = request.email {
            contact = contact.with_email(email)?;
        }

        if let Some(mobile_phone) = request.mobile_phone {
            contact = contact.with_mobile_phone(mobile_phone);
        }

        if let Some(date) = request.date_of_birth {
            contact = contact.with_date_of_birth(date);
        }

        if let Some(date) = request.anniversary_date {
            contact = contact.with_anniversary_date(date);
        }

        let created = self.repository.create(contact).await?;
        info!(contact_id = %created.id(), "Contact created");
        Ok(created)
    }

    /// Update an existing contact
    ///
    /// With `expected` set, the update only applies if the stored contact
    /// still carries that version; otherwise it fails with `Conflict`.
    /// Without it the write is unconditional.
    pub async fn update(
        &self,
        id: &str,
        request: UpdateContactRequest,
        expected: Option<&EncodedVersionToken>,
    ) -> Result<Contact, DomainError> {
        let contact_id = ContactId::new(id)?;

        let mut contact = self
            .repository
            .get(&contact_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Contact '{}' not found", id)))?;

        if let Some(first_name) = request.first_name {
            contact.set_first_name(first_name)?;
        }

        if let Some(last_name) = request.last_name {
            contact.set_last_name(last_name)?;
        }

        if let Some(is_family_member) = request.is_family_member {
            contact.set_family_member(is_family_member);
        }

        if let Some(company) = request.company {
            contact.set_company(Some(company));
        }

        if let Some(job_title) = request.job_title {
            contact.set_job_title(Some(job_title));
        }

        if let Some(email) = request.email {
            contact.set_email(Some(email))?;
        }

        if let Some(mobile_phone) = request.mobile_phone {
            contact.set_mobile_phone(Some(mobile_phone));
        }

        if let Some(date) = request.date_of_birth {
            contact.set_date_of_birth(Some(date));
        }

        if let Some(date) = request.anniversary_date {
            contact.set_anniversary_date(Some(date));
        }

        let replaced = contact.row_version().encode();

        // An empty version makes the store write unconditionally
        let expected_version = match expected {
            Some(expected) => VersionToken::try_from(expected.as_str().to_string()).map_err(
                |_| {
                    DomainError::conflict(format!(
                        "Contact '{}' does not match version {}",
                        id, expected
                    ))
                },
            )?,
            None => VersionToken::default(),
        };
        contact = contact.with_row_version(expected_version);

        let updated = self.repository.update(contact).await?;
        info!(contact_id = %updated.id(), "Contact updated");

        self.evict_snapshot(&contact_id, replaced.as_ref()).await;
        Ok(updated)
    }

    /// Delete a contact by ID
    pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let contact_id = ContactId::new(id)?;
        let existing = self.repository.get(&contact_id).await?;
        let deleted = self.repository.delete(&contact_id).await?;

        debug!(contact_id = %contact_id, deleted, "Contact delete requested");

        if let Some(existing) = existing {
            self.evict_snapshot(&contact_id, existing.row_version().encode().as_ref())
                .await;
        }

        Ok(deleted)
    }

    /// Drops the snapshot cached under a version that no longer exists
    ///
    /// Snapshots of versions this process never saw replaced still expire
    /// on their own.
    async fn evict_snapshot(&self, id: &ContactId, token: Option<&EncodedVersionToken>) {
        let Some(token) = token else {
            return;
        };

        let key = CacheKeyPrefix::new(CONTACT_RESOURCE, id.as_str()).key_for(token);

        if let Err(e) = self.conditional.cache().delete(&key).await {
            warn!(key = %key, error = %e, "Failed to evict replaced snapshot");
        }
    }
}
