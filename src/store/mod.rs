//! Durable Store Module
//!
//! Defines the interface to the durable record store behind the cache, plus
//! the identifier and attribute types shared across the crate.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

mod memory;

pub use memory::MemoryStore;

// == Attribute Map ==
/// A record's attributes, decoded from a cache entry or a store record.
///
/// Values are `serde_json::Value`, so attributes may be strings, numbers,
/// booleans, null, arrays, or nested maps. Keys are unique per entity.
pub type AttributeMap = serde_json::Map<String, Value>;

// == Entity Id ==
/// Identifier unique within an entity type. Integer or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Extracts an id from an attribute value, as found in foreign-key
    /// attributes. Integers and strings are ids; everything else is not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Int),
            Value::String(s) => Some(EntityId::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{}", id),
            EntityId::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Str(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::Str(id)
    }
}

// == Relation Target ==
/// Where a named relation points: the related entity type and the attribute
/// on the owning record that holds the related id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationTarget {
    /// Entity type of the related record
    pub entity_type: String,
    /// Attribute on the owning record holding the foreign key
    pub foreign_key: String,
}

impl RelationTarget {
    pub fn new(entity_type: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

// == Record Store Trait ==
/// Interface to the durable record store.
///
/// The cache engine never talks to the database directly; everything flows
/// through this trait. Implementations must be safe to share across tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Capability predicate: whether `entity_type` has opted into caching.
    ///
    /// Every cache operation checks this before touching the KV transport.
    fn is_cacheable(&self, entity_type: &str) -> bool;

    /// Loads the canonical record, or `None` if no such record exists.
    async fn find(&self, entity_type: &str, id: &EntityId) -> Result<Option<AttributeMap>>;

    /// Persists a single attribute change to the durable store.
    async fn update_attribute(
        &self,
        entity_type: &str,
        id: &EntityId,
        name: &str,
        value: Value,
    ) -> Result<()>;

    /// Schema introspection: resolves a relation name to its target type and
    /// foreign-key attribute, or `None` if the type has no such relation.
    fn relation_target(&self, entity_type: &str, relation: &str) -> Option<RelationTarget>;
}
