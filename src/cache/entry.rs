//! Cache Entry Module
//!
//! Defines the serialized snapshot stored per entity in the KV backend.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::AttributeMap;

// == Cache Entry ==
/// A snapshot of a record's attributes plus its insertion timestamp.
///
/// The TTL itself is owned by the KV backend; the embedded timestamp exists
/// so the batched eviction sweep can order entries by age without extra
/// bookkeeping state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Attribute snapshot of the record
    pub attributes: AttributeMap,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(attributes: AttributeMap) -> Self {
        Self {
            attributes,
            inserted_at: Utc::now().timestamp_millis(),
        }
    }

    // == Codec ==
    /// Serializes the entry for the KV transport.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes an entry read back from the KV transport.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
