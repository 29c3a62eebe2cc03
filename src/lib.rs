//! Entity Cache - a read-through/write-through cache for durable records
//!
//! Sits between application code and a durable record store, keyed by
//! (entity type, id). Lookups are served from a key-value backend when
//! possible and populated from the store on miss; attribute writes persist to
//! the store before the cache is refreshed. Population is bounded by TTL and
//! a configurable eviction policy, and named relations can be prefetched
//! through the same engine.

pub mod cache;
pub mod config;
pub mod error;
pub mod kv;
pub mod store;
pub mod tasks;

pub use cache::{CacheKey, CacheStats, Entity, EntityCache};
pub use config::{Config, EvictionStrategy, RefreshMode};
pub use error::{CacheError, Result};
pub use kv::{KvStore, MemoryKv};
pub use store::{AttributeMap, EntityId, MemoryStore, RecordStore, RelationTarget};
pub use tasks::spawn_purge_task;
