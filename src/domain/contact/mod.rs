//! Contact domain module
//!
//! Contacts are the single resource served over HTTP. Each stored contact
//! carries a store-issued `row_version`, which makes it eligible for
//! conditional (ETag) responses.

mod entity;
mod repository;
mod validation;

pub use entity::{Contact, ContactId};
pub use repository::ContactRepository;
pub use validation::{validate_contact_id, validate_email, validate_name, ContactValidationError};

#[cfg(test)]
pub use repository::MockContactRepository;
