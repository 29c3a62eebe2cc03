//! In-Memory Record Store
//!
//! Reference [`RecordStore`] implementation backed by hash maps. Carries call
//! counters and an injectable write failure so callers can assert on adapter
//! traffic and error paths.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CacheError, Result};
use crate::store::{AttributeMap, EntityId, RecordStore, RelationTarget};

// == Memory Store ==
/// In-memory durable store: registered cacheable types, records keyed by
/// (type, id), and a relation schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Types that have opted into caching
    cacheable: RwLock<HashSet<String>>,
    /// Canonical records
    records: RwLock<HashMap<(String, EntityId), AttributeMap>>,
    /// Relation schema: (owner type, relation name) to target
    relations: RwLock<HashMap<(String, String), RelationTarget>>,
    /// Number of find calls served
    find_calls: AtomicU64,
    /// Number of update calls served
    update_calls: AtomicU64,
    /// When set, update_attribute fails without touching the record
    reject_updates: AtomicBool,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store with no cacheable types.
    pub fn new() -> Self {
        Self::default()
    }

    // == Setup ==
    /// Registers an entity type as cache-eligible.
    pub fn register_type(&self, entity_type: impl Into<String>) {
        self.cacheable
            .write()
            .expect("cacheable lock poisoned")
            .insert(entity_type.into());
    }

    /// Inserts or replaces a canonical record.
    pub fn insert_record(
        &self,
        entity_type: impl Into<String>,
        id: impl Into<EntityId>,
        attributes: AttributeMap,
    ) {
        self.records
            .write()
            .expect("records lock poisoned")
            .insert((entity_type.into(), id.into()), attributes);
    }

    /// Declares a relation in the schema.
    pub fn define_relation(
        &self,
        entity_type: impl Into<String>,
        relation: impl Into<String>,
        target: RelationTarget,
    ) {
        self.relations
            .write()
            .expect("relations lock poisoned")
            .insert((entity_type.into(), relation.into()), target);
    }

    // == Inspection ==
    /// Reads a record directly, bypassing any cache in front of this store.
    pub fn record(&self, entity_type: &str, id: &EntityId) -> Option<AttributeMap> {
        self.records
            .read()
            .expect("records lock poisoned")
            .get(&(entity_type.to_string(), id.clone()))
            .cloned()
    }

    /// Number of `find` calls served so far.
    pub fn find_calls(&self) -> u64 {
        self.find_calls.load(Ordering::Relaxed)
    }

    /// Number of `update_attribute` calls served so far.
    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::Relaxed)
    }

    // == Failure Injection ==
    /// Makes subsequent `update_attribute` calls fail until disabled.
    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::Relaxed);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn is_cacheable(&self, entity_type: &str) -> bool {
        self.cacheable
            .read()
            .expect("cacheable lock poisoned")
            .contains(entity_type)
    }

    async fn find(&self, entity_type: &str, id: &EntityId) -> Result<Option<AttributeMap>> {
        self.find_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .records
            .read()
            .expect("records lock poisoned")
            .get(&(entity_type.to_string(), id.clone()))
            .cloned())
    }

    async fn update_attribute(
        &self,
        entity_type: &str,
        id: &EntityId,
        name: &str,
        value: Value,
    ) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);

        if self.reject_updates.load(Ordering::Relaxed) {
            return Err(CacheError::Store(format!(
                "write rejected for `{}` id {}",
                entity_type, id
            )));
        }

        let mut records = self.records.write().expect("records lock poisoned");
        match records.get_mut(&(entity_type.to_string(), id.clone())) {
            Some(attributes) => {
                attributes.insert(name.to_string(), value);
                Ok(())
            }
            None => Err(CacheError::Store(format!(
                "no record to update for `{}` id {}",
                entity_type, id
            ))),
        }
    }

    fn relation_target(&self, entity_type: &str, relation: &str) -> Option<RelationTarget> {
        self.relations
            .read()
            .expect("relations lock poisoned")
            .get(&(entity_type.to_string(), relation.to_string()))
            .cloned()
    }
}
