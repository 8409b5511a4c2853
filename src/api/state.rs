//! Application state for shared services

use std::sync::Arc;

use subtle::{Choice, ConstantTimeEq};

use crate::domain::{Cache, Contact, DomainError, EncodedVersionToken, Resolution};
use crate::infrastructure::services::{
    ContactService, CreateContactRequest, UpdateContactRequest,
};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub contact_service: Arc<dyn ContactServiceTrait>,
    pub cache: Arc<dyn Cache>,
    /// Accepted user keys; empty means the check is off
    pub user_keys: Arc<[String]>,
}

impl AppState {
    pub fn new(
        contact_service: Arc<dyn ContactServiceTrait>,
        cache: Arc<dyn Cache>,
        user_keys: Vec<String>,
    ) -> Self {
        Self {
            contact_service,
            cache,
            user_keys: user_keys.into(),
        }
    }

    pub fn requires_user_key(&self) -> bool {
        !self.user_keys.is_empty()
    }

    /// Checks `key` against every configured key in constant time
    pub fn is_valid_user_key(&self, key: &str) -> bool {
        let matched = self
            .user_keys
            .iter()
            .fold(Choice::from(0), |acc, k| acc | k.as_bytes().ct_eq(key.as_bytes()));

        bool::from(matched)
    }
}

/// Trait for contact service operations
#[async_trait::async_trait]
pub trait ContactServiceTrait: Send + Sync {
    async fn get_conditional(
        &self,
        id: &str,
        caller_token: Option<&EncodedVersionToken>,
    ) -> Result<Resolution<Contact>, DomainError>;
    async fn list(&self) -> Result<Vec<Contact>, DomainError>;
    async fn create(&self, request: CreateContactRequest) -> Result<Contact, DomainError>;
    async fn update(
        &self,
        id: &str,
        request: UpdateContactRequest,
        expected: Option<&EncodedVersionToken>,
    ) -> Result<Contact, DomainError>;
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
}

#[async_trait::async_trait]
impl ContactServiceTrait for ContactService {
    async fn get_conditional(
        &self,
        id: &str,
        caller_token: Option<&EncodedVersionToken>,
    ) -> Result<Resolution<Contact>, DomainError> {
        ContactService::get_conditional(self, id, caller_token).await
    }

    async fn list(&self) -> Result<Vec<Contact>, DomainError> {
        ContactService::list(self).await
    }

    async fn create(&self, request: CreateContactRequest) -> Result<Contact, DomainError> {
        ContactService::create(self, request).await
    }

    async fn update(
        &self,
        id: &str,
        request: UpdateContactRequest,
        expected: Option<&EncodedVersionToken>,
    ) -> Result<Contact, DomainError> {
        ContactService::update(self, id, request, expected).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        ContactService::delete(self, id).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.repository().count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConditionalCache, SystemClock};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::storage::InMemoryContactRepository;

    fn state(user_keys: &[&str]) -> AppState {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = ContactService::new(
            Arc::new(InMemoryContactRepository::new()),
            ConditionalCache::new(cache.clone(), Arc::new(SystemClock)),
        );

        AppState::new(
            Arc::new(service),
            cache,
            user_keys.iter().map(|k| k.to_string()).collect(),
        )
    }

    #[test]
    fn test_no_keys_configured() {
        let state = state(&[]);

        assert!(!state.requires_user_key());
        assert!(!state.is_valid_user_key("anything"));
    }

    #[test]
    fn test_user_key_matching() {
        let state = state(&["key-1", "key-2"]);

        assert!(state.requires_user_key());
        assert!(state.is_valid_user_key("key-1"));
        assert!(state.is_valid_user_key("key-2"));
        assert!(!state.is_valid_user_key("key-3"));
        assert!(!state.is_valid_user_key("key-"));
        assert!(!state.is_valid_user_key("key-10"));
        assert!(!state.is_valid_user_key(""));
    }
}
