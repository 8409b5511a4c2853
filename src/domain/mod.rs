//! Domain layer - Core business logic and entities

pub mod cache;
pub mod clock;
pub mod conditional;
pub mod contact;
pub mod error;
pub mod versioning;

pub use cache::{Cache, CacheExt, CacheKeyPrefix};
pub use clock::{Clock, ManualClock, SystemClock};
pub use conditional::{ConditionalCache, Resolution, VersionedStore, DEFAULT_SNAPSHOT_TTL_SECS};
pub use contact::{Contact, ContactId, ContactRepository, ContactValidationError};
pub use error::DomainError;
pub use versioning::{EncodedVersionToken, VersionToken, Versioned};
