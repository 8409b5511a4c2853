//! Cache domain - expiring key/value store contract

mod key;
mod repository;

pub use key::CacheKeyPrefix;
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
