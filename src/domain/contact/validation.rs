//! Contact validation

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during contact validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContactValidationError {
    #[error("Contact ID cannot be empty")]
    EmptyId,

    #[error("Contact ID cannot exceed {0} characters")]
    IdTooLong(usize),

    #[error("Contact ID can only contain alphanumeric characters, hyphens and underscores")]
    InvalidIdCharacters,

    #[error("{0} cannot be empty")]
    EmptyName(&'static str),

    #[error("{0} cannot exceed {1} characters")]
    NameTooLong(&'static str, usize),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

impl From<ContactValidationError> for DomainError {
    fn from(err: ContactValidationError) -> Self {
        match err {
            ContactValidationError::EmptyId
            | ContactValidationError::IdTooLong(_)
            | ContactValidationError::InvalidIdCharacters => DomainError::invalid_id(err.to_string()),
            _ => DomainError::validation(err.to_string()),
        }
    }
}

const MAX_CONTACT_ID_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 100;

/// Validate a contact ID
pub fn validate_contact_id(id: &str) -> Result<(), ContactValidationError> {
    if id.is_empty() {
        return Err(ContactValidationError::EmptyId);
    }

    if id.len() > MAX_CONTACT_ID_LENGTH {
        return Err(ContactValidationError::IdTooLong(MAX_CONTACT_ID_LENGTH));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ContactValidationError::InvalidIdCharacters);
    }

    Ok(())
}

/// Validate a first or last name
pub fn validate_name(field: &'static str, name: &str) -> Result<(), ContactValidationError> {
    if name.trim().is_empty() {
        return Err(ContactValidationError::EmptyName(field));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ContactValidationError::NameTooLong(field, MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Minimal shape check: one `@` with text on both sides and a dotted domain
pub fn validate_email(email: &str) -> Result<(), ContactValidationError> {
    let invalid = || ContactValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}
