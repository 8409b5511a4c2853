//! Conditional resolution of versioned entities through an expiring cache
//!
//! A request carries the version token the client last saw (if any). The
//! resolver tries the snapshot cached under that token, falls back to the
//! persistent store, re-publishes the snapshot under the entity's current
//! token and tells the caller whether the client copy is still current.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheExt, CacheKeyPrefix};
use crate::domain::clock::Clock;
use crate::domain::versioning::{EncodedVersionToken, Versioned};
use crate::domain::DomainError;

/// Lifetime of a cached snapshot, measured from the moment it is written
pub const DEFAULT_SNAPSHOT_TTL_SECS: i64 = 30 * 60;

/// Persistent store lookup the resolver falls back to on a cache miss
#[async_trait]
pub trait VersionedStore<E>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<E>, DomainError>;
}

/// Outcome of a conditional lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<E> {
    /// The client copy is missing or stale; serve `entity` in full.
    ///
    /// `etag` is `None` for entities without a usable version token.
    Modified {
        entity: E,
        etag: Option<EncodedVersionToken>,
    },
    /// The client already holds the current version
    NotModified { etag: EncodedVersionToken },
}

impl<E> Resolution<E> {
    pub fn etag(&self) -> Option<&EncodedVersionToken> {
        match self {
            Self::Modified { etag, .. } => etag.as_ref(),
            Self::NotModified { etag } => Some(etag),
        }
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, Self::Modified { .. })
    }

    pub fn into_entity(self) -> Option<E> {
        match self {
            Self::Modified { entity, .. } => Some(entity),
            Self::NotModified { .. } => None,
        }
    }
}

/// Version-negotiating front for a `VersionedStore`
///
/// Cache failures never fail a resolution: read errors and unreadable
/// snapshots count as misses, write errors are logged and dropped.
#[derive(Debug, Clone)]
pub struct ConditionalCache {
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ConditionalCache {
    pub fn new(cache: Arc<dyn Cache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            clock,
            ttl: Duration::seconds(DEFAULT_SNAPSHOT_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Resolves `prefix.id()` against the client's last seen token
    ///
    /// Returns `DomainError::NotFound` when neither the cache nor the store
    /// has the entity. Store errors propagate unchanged.
    pub async fn resolve<E, S>(
        &self,
        prefix: &CacheKeyPrefix,
        caller_token: Option<&EncodedVersionToken>,
        store: &S,
    ) -> Result<Resolution<E>, DomainError>
    where
        E: Versioned + Serialize + DeserializeOwned + Send + Sync,
        S: VersionedStore<E> + ?Sized,
    {
        let cached = match caller_token {
            Some(token) if token.is_canonical() => self
                .lookup::<E>(&prefix.key_for(token))
                .await
                .filter(|entity| Self::belongs_to(entity, prefix)),
            Some(token) => {
                debug!(resource = %prefix, token = %token, "Token was never issued, skipping lookup");
                None
            }
            None => None,
        };

        let entity = match cached {
            Some(entity) => entity,
            None => store.find_by_id(prefix.id()).await?.ok_or_else(|| {
                DomainError::not_found(format!(
                    "{} '{}' not found",
                    prefix.resource(),
                    prefix.id()
                ))
            })?,
        };

        let Some(etag) = entity.encoded_version_token() else {
            debug!(resource = %prefix, "Entity has no version token, skipping cache");
            counter!("conditional_responses_total", "outcome" => "modified").increment(1);
            return Ok(Resolution::Modified { entity, etag: None });
        };

        self.store_snapshot(&prefix.key_for(&etag), &entity).await;

        let unchanged = caller_token.is_some_and(|token| *token == etag);

        if unchanged {
            debug!(resource = %prefix, etag = %etag, "Client copy is current");
            counter!("conditional_responses_total", "outcome" => "not_modified").increment(1);
            Ok(Resolution::NotModified { etag })
        } else {
            debug!(resource = %prefix, etag = %etag, "Serving current version");
            counter!("conditional_responses_total", "outcome" => "modified").increment(1);
            Ok(Resolution::Modified {
                entity,
                etag: Some(etag),
            })
        }
    }

    fn belongs_to<E: Versioned>(entity: &E, prefix: &CacheKeyPrefix) -> bool {
        match entity.snapshot_id() {
            Some(id) if id != prefix.id() => {
                warn!(resource = %prefix, snapshot_id = %id, "Snapshot belongs to another entity, ignoring");
                false
            }
            _ => true,
        }
    }

    async fn lookup<E>(&self, key: &str) -> Option<E>
    where
        E: DeserializeOwned + Send,
    {
        match self.cache.get::<E>(key).await {
            Ok(Some(entity)) => {
                debug!(key = %key, "Snapshot cache hit");
                counter!("snapshot_cache_lookups_total", "outcome" => "hit").increment(1);
                Some(entity)
            }
            Ok(None) => {
                debug!(key = %key, "Snapshot cache miss");
                counter!("snapshot_cache_lookups_total", "outcome" => "miss").increment(1);
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Snapshot cache read failed, falling back to store");
                counter!("snapshot_cache_lookups_total", "outcome" => "degraded").increment(1);
                None
            }
        }
    }

    async fn store_snapshot<E>(&self, key: &str, entity: &E)
    where
        E: Serialize + Send + Sync,
    {
        let expires_at = self.clock.now() + self.ttl;

        match self.cache.set(key, entity, expires_at).await {
            Ok(()) => {
                counter!("snapshot_cache_writes_total", "status" => "ok").increment(1);
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Snapshot cache write failed");
                counter!("snapshot_cache_writes_total", "status" => "error").increment(1);
            }
        }
    }
}
