//! Error types for the entity cache
//!
//! Provides unified error handling using thiserror.

use crate::store::EntityId;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the entity cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Entity type is not registered as cache-eligible
    #[error("Entity type `{0}` is not cache-eligible")]
    NotCacheable(String),

    /// Durable store has no record for the requested id
    #[error("No record found for `{entity_type}` id {id}")]
    RecordMissing { entity_type: String, id: EntityId },

    /// Attribute is absent from the entity's snapshot
    #[error("Attribute not found: {0}")]
    AttributeMissing(String),

    /// Schema introspection knows no relation by that name
    #[error("Entity type `{entity_type}` has no relation `{relation}`")]
    UnknownRelation {
        entity_type: String,
        relation: String,
    },

    /// Relation accessed without a prior resolve
    #[error("Relation `{0}` has not been resolved")]
    UnresolvedRelation(String),

    /// Foreign-key attribute does not hold an integer or string id
    #[error("Relation `{relation}`: foreign key `{attribute}` is not an id")]
    ForeignKeyType { relation: String, attribute: String },

    /// Durable store I/O failure
    #[error("Store error: {0}")]
    Store(String),

    /// KV transport unreachable or misbehaving
    #[error("Cache transport error: {0}")]
    Transport(String),

    /// Entry snapshot failed to serialize or deserialize
    #[error("Entry codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the entity cache.
pub type Result<T> = std::result::Result<T, CacheError>;
