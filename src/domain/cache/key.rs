//! Cache key construction for versioned snapshots

use std::fmt;

use crate::domain::versioning::EncodedVersionToken;

/// Resource-type/id portion of a snapshot cache key
///
/// Full keys are `<resource>-<id>-<token>`, so every version of the same
/// resource shares the prefix and distinct versions never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKeyPrefix {
    resource: &'static str,
    id: String,
}

impl CacheKeyPrefix {
    pub fn new(resource: &'static str, id: impl Into<String>) -> Self {
        Self {
            resource,
            id: id.into(),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Key under which the snapshot for `token` is stored
    pub fn key_for(&self, token: &EncodedVersionToken) -> String {
        format!("{}-{}-{}", self.resource, self.id, token.as_str())
    }
}

impl fmt::Display for CacheKeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.resource, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_format() {
        let prefix = CacheKeyPrefix::new("contact", "c1");
        assert_eq!(prefix.to_string(), "contact-c1");
        assert_eq!(prefix.resource(), "contact");
        assert_eq!(prefix.id(), "c1");
    }

    #[test]
    fn test_key_for_token() {
        let prefix = CacheKeyPrefix::new("contact", "c1");
        let token = EncodedVersionToken::parse("AQI=").unwrap();

        assert_eq!(prefix.key_for(&token), "contact-c1-AQI=");
    }

    #[test]
    fn test_different_ids_do_not_share_keys() {
        let token = EncodedVersionToken::parse("AQI=").unwrap();
        let a = CacheKeyPrefix::new("contact", "c1").key_for(&token);
        let b = CacheKeyPrefix::new("contact", "c2").key_for(&token);

        assert_ne!(a, b);
    }
}
