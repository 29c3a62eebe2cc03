//! Relation Prefetcher
//!
//! Resolves named relations of a cached entity by following a foreign-key
//! attribute to the related (type, id) and looking that entity up through the
//! engine. Results are memoized on the handle, so repeated resolves of the
//! same name cost nothing.

use tracing::debug;

use crate::cache::engine::EntityCache;
use crate::cache::handle::Entity;
use crate::error::{CacheError, Result};
use crate::kv::KvStore;
use crate::store::{EntityId, RecordStore};

impl<S, K> EntityCache<S, K>
where
    S: RecordStore,
    K: KvStore,
{
    // == Resolve ==
    /// Resolves the named relations onto the handle's memo.
    ///
    /// Each name is resolved at most once per handle: already-memoized names
    /// are skipped without any store or KV traffic. Resolution descends a
    /// single level; the related handles come back with empty memos of their
    /// own, so cyclic schemas only recurse if the caller walks the cycle.
    pub async fn resolve(&self, entity: &mut Entity, names: &[&str]) -> Result<()> {
        for &name in names {
            if entity.relations.contains_key(name) {
                continue;
            }

            let target = self
                .store()
                .relation_target(&entity.entity_type, name)
                .ok_or_else(|| CacheError::UnknownRelation {
                    entity_type: entity.entity_type.clone(),
                    relation: name.to_string(),
                })?;

            let foreign_key = entity.attribute(&target.foreign_key)?;
            let related_id =
                EntityId::from_value(foreign_key).ok_or_else(|| CacheError::ForeignKeyType {
                    relation: name.to_string(),
                    attribute: target.foreign_key.clone(),
                })?;

            debug!(
                entity_type = %entity.entity_type,
                relation = name,
                related_type = %target.entity_type,
                "resolving relation"
            );
            let related = self.lookup(&target.entity_type, related_id).await?;
            entity.relations.insert(name.to_string(), related);
        }
        Ok(())
    }
}
