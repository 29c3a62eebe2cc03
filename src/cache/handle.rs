//! Entity Handle Module
//!
//! The value returned by a cache lookup: the decoded attribute snapshot plus
//! a per-handle memo of resolved relations. A handle only exists after a
//! successful lookup and is single-use for its lifetime; the memo dies with
//! it and is never persisted.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{CacheError, Result};
use crate::store::{AttributeMap, EntityId};

// == Entity ==
/// A cached entity: type, id, attributes, and resolved relations.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) entity_type: String,
    pub(crate) id: EntityId,
    pub(crate) attributes: AttributeMap,
    pub(crate) relations: HashMap<String, Entity>,
}

impl Entity {
    // == Constructor ==
    /// Binds a handle to a freshly decoded snapshot. Only the engine creates
    /// handles, so every `Entity` in existence is backed by a lookup.
    pub(crate) fn new(entity_type: &str, id: EntityId, attributes: AttributeMap) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            id,
            attributes,
            relations: HashMap::new(),
        }
    }

    // == Identity ==
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    // == Attributes ==
    /// Returns the cached value of an attribute.
    pub fn attribute(&self, name: &str) -> Result<&Value> {
        self.attributes
            .get(name)
            .ok_or_else(|| CacheError::AttributeMissing(name.to_string()))
    }

    /// The full attribute snapshot.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    // == Relations ==
    /// Returns a previously resolved relation.
    ///
    /// Fails with [`CacheError::UnresolvedRelation`] if the name was never
    /// passed to a `resolve` call on this handle.
    pub fn relation(&self, name: &str) -> Result<&Entity> {
        self.relations
            .get(name)
            .ok_or_else(|| CacheError::UnresolvedRelation(name.to_string()))
    }

    /// Mutable access to a previously resolved relation, for resolving the
    /// related handle's own relations in place.
    pub fn relation_mut(&mut self, name: &str) -> Result<&mut Entity> {
        self.relations
            .get_mut(name)
            .ok_or_else(|| CacheError::UnresolvedRelation(name.to_string()))
    }

    /// Names of relations resolved on this handle so far.
    pub fn resolved_relations(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }
}
