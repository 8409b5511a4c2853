//! Version tokens and the capability trait for versioned entities

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Opaque marker that changes whenever an entity's persisted content changes
///
/// Produced and maintained by the persistent store; serialized as base64 so
/// cached snapshots round-trip it losslessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionToken(Vec<u8>);

impl VersionToken {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Token derived from a store sequence number (big-endian)
    pub fn from_sequence(sequence: u64) -> Self {
        Self(sequence.to_be_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the token for cache keys and the ETag header.
    ///
    /// Returns `None` for an empty token.
    pub fn encode(&self) -> Option<EncodedVersionToken> {
        if self.0.is_empty() {
            return None;
        }

        Some(EncodedVersionToken(STANDARD.encode(&self.0)))
    }
}

impl TryFrom<String> for VersionToken {
    type Error = base64::DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        STANDARD.decode(value).map(Self)
    }
}

impl From<VersionToken> for String {
    fn from(token: VersionToken) -> Self {
        STANDARD.encode(token.0)
    }
}

/// Version token as it travels over the wire and inside cache keys
///
/// Tokens sent by clients are taken verbatim and are never required to be
/// valid base64; they only ever need to compare equal to a token we issued.
/// Only canonical ones (see `is_canonical`) are used in cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedVersionToken(String);

impl EncodedVersionToken {
    /// Wraps a raw header value; empty or whitespace-only input yields `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this is the exact encoding of some non-empty token
    ///
    /// Only canonical tokens are used to build cache keys; the base64
    /// alphabet has no `-`, so a canonical token cannot reach into the
    /// `<resource>-<id>` part of a key.
    pub fn is_canonical(&self) -> bool {
        match STANDARD.decode(&self.0) {
            Ok(bytes) => !bytes.is_empty() && STANDARD.encode(&bytes) == self.0,
            Err(_) => false,
        }
    }
}

impl std::fmt::Display for EncodedVersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability implemented by entities that carry a version token
///
/// Types that keep the default implementation are never cached and always
/// resolve as modified.
pub trait Versioned {
    fn version_token(&self) -> Option<&VersionToken> {
        None
    }

    /// ID a cached snapshot must carry to be served for a given key prefix
    ///
    /// `None` skips the check.
    fn snapshot_id(&self) -> Option<&str> {
        None
    }

    /// Encoded token, if the entity has a non-empty one
    fn encoded_version_token(&self) -> Option<EncodedVersionToken> {
        self.version_token().and_then(VersionToken::encode)
    }
}
