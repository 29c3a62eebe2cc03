//! Entity Cache Engine
//!
//! The read-through/write-through core: lookup with insert-on-miss, attribute
//! writes persisted to the durable store before the cache is touched, and
//! explicit per-type invalidation.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::entry::CacheEntry;
use crate::cache::eviction::EvictionPolicy;
use crate::cache::handle::Entity;
use crate::cache::key::CacheKey;
use crate::cache::stats::{CacheStats, StatsCounters};
use crate::config::{Config, RefreshMode};
use crate::error::{CacheError, Result};
use crate::kv::KvStore;
use crate::store::{EntityId, RecordStore};

// == Entity Cache ==
/// Cache engine over a durable [`RecordStore`] and a [`KvStore`] transport.
///
/// Safe to share across tasks behind an `Arc`; all methods take `&self`.
/// Consistency is per-entry and best-effort: two racing misses may both fetch
/// and both write (last write wins, values equivalent), and a crash between
/// the durable write and the cache refresh leaves the entry stale until TTL
/// expiry or the next lookup.
#[derive(Debug)]
pub struct EntityCache<S, K> {
    store: Arc<S>,
    kv: Arc<K>,
    policy: EvictionPolicy,
    ttl_seconds: u64,
    refresh: RefreshMode,
    stats: StatsCounters,
}

impl<S, K> EntityCache<S, K>
where
    S: RecordStore,
    K: KvStore,
{
    // == Constructor ==
    /// Creates an engine with the given adapters and configuration.
    pub fn new(store: Arc<S>, kv: Arc<K>, config: &Config) -> Self {
        Self {
            store,
            kv,
            policy: EvictionPolicy::from_config(config),
            ttl_seconds: config.ttl_seconds,
            refresh: config.refresh,
            stats: StatsCounters::new(),
        }
    }

    // == Adapters ==
    /// The durable store behind the cache.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The KV transport the entries live in.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    // == Lookup ==
    /// Returns an entity handle, from cache or from the durable store.
    ///
    /// On a hit the entry's TTL is re-armed. On a miss the eviction policy
    /// runs first, then the canonical record is fetched and written into the
    /// cache. Fails with [`CacheError::NotCacheable`] before touching any
    /// adapter if the type has not opted into caching, and with
    /// [`CacheError::RecordMissing`] when the durable store has no such
    /// record (nothing is cached in that case).
    pub async fn lookup(&self, entity_type: &str, id: impl Into<EntityId>) -> Result<Entity> {
        if !self.store.is_cacheable(entity_type) {
            return Err(CacheError::NotCacheable(entity_type.to_string()));
        }

        let id = id.into();
        let key = CacheKey::encode(entity_type, &id);

        if let Some(bytes) = self.kv.get(key.as_str()).await? {
            let entry = CacheEntry::decode(&bytes)?;
            self.kv.expire(key.as_str(), self.ttl_seconds).await?;
            self.stats.record_hit();
            debug!(%key, "cache hit");
            return Ok(Entity::new(entity_type, id, entry.attributes));
        }

        self.stats.record_miss();
        debug!(%key, "cache miss");

        let evicted = self.policy.before_insert(self.kv.as_ref(), entity_type).await?;
        self.stats.record_evictions(evicted);

        let attributes = self
            .store
            .find(entity_type, &id)
            .await?
            .ok_or_else(|| CacheError::RecordMissing {
                entity_type: entity_type.to_string(),
                id: id.clone(),
            })?;

        let entry = CacheEntry::new(attributes.clone());
        self.kv
            .set(key.as_str(), entry.encode()?, self.ttl_seconds)
            .await?;

        Ok(Entity::new(entity_type, id, attributes))
    }

    // == Set Attribute ==
    /// Write-through attribute update.
    ///
    /// The durable store is written first; if that fails, the cache and the
    /// handle are left unmodified and the error surfaces. A failure while
    /// refreshing the cache afterwards does not mask the successful durable
    /// write: it is logged and the call still succeeds, leaving the entry
    /// stale until TTL expiry or the next lookup.
    pub async fn set_attribute(
        &self,
        entity: &mut Entity,
        name: &str,
        value: Value,
    ) -> Result<()> {
        self.store
            .update_attribute(&entity.entity_type, &entity.id, name, value.clone())
            .await?;

        entity.attributes.insert(name.to_string(), value);

        if let Err(err) = self.refresh_entry(entity).await {
            warn!(
                entity_type = %entity.entity_type,
                id = %entity.id,
                error = %err,
                "cache refresh failed after durable write"
            );
        }
        Ok(())
    }

    /// Applies several attribute updates in order, write-through each.
    pub async fn set_attributes(
        &self,
        entity: &mut Entity,
        pairs: Vec<(String, Value)>,
    ) -> Result<()> {
        for (name, value) in pairs {
            self.set_attribute(entity, &name, value).await?;
        }
        Ok(())
    }

    /// Re-inserts the entry after a write, per the configured refresh mode.
    async fn refresh_entry(&self, entity: &Entity) -> Result<()> {
        let key = CacheKey::encode(&entity.entity_type, &entity.id);
        let attributes = match self.refresh {
            RefreshMode::Overwrite => entity.attributes.clone(),
            RefreshMode::Refetch => {
                match self.store.find(&entity.entity_type, &entity.id).await? {
                    Some(attributes) => attributes,
                    None => {
                        // Record vanished under us; drop the stale entry
                        self.kv.delete(key.as_str()).await?;
                        return Ok(());
                    }
                }
            }
        };

        let entry = CacheEntry::new(attributes);
        self.kv
            .set(key.as_str(), entry.encode()?, self.ttl_seconds)
            .await
    }

    // == Invalidate ==
    /// Deletes every cache entry of one type; returns the number deleted.
    ///
    /// Keys that disappear mid-scan are not errors.
    pub async fn invalidate_all(&self, entity_type: &str) -> Result<u64> {
        if !self.store.is_cacheable(entity_type) {
            return Err(CacheError::NotCacheable(entity_type.to_string()));
        }

        let prefix = CacheKey::prefix_for(entity_type);
        let keys = self.kv.keys_with_prefix(&prefix).await?;

        let mut deleted = 0u64;
        for key in keys {
            if self.kv.delete(&key).await? {
                deleted += 1;
            }
        }

        self.stats.record_invalidations(deleted);
        info!(entity_type, deleted, "invalidated cached entries");
        Ok(deleted)
    }

    // == Stats ==
    /// Snapshot of engine metrics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}
