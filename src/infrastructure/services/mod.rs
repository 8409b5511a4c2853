//! Infrastructure services

mod contact_service;

pub use contact_service::{
    ContactService, CreateContactRequest, UpdateContactRequest, CONTACT_RESOURCE,
};
