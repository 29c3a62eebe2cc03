//! KV Transport Module
//!
//! Interface to the key-value backend the cache entries live in. The engine
//! owns no entry state of its own; everything durable-but-evictable sits
//! behind this trait.

use async_trait::async_trait;

use crate::error::Result;

mod memory;

pub use memory::MemoryKv;

// == KV Store Trait ==
/// Key-value transport primitives consumed by the cache engine.
///
/// Entry keys and counter names are separate keyspaces: `keys_with_prefix`
/// never returns counter names, and counter operations never touch entry
/// keys. Backends that share one physical keyspace must namespace counters
/// themselves.
///
/// `keys_with_prefix` takes a literal prefix, not a glob. Backends whose scan
/// is pattern-based rather than indexed make this O(total keys); callers
/// tolerate that cost.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads a value, or `None` if the key is missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes a value with a TTL. Overwrites and re-arms the TTL if present.
    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<()>;

    /// Deletes a key. Returns whether a live entry was removed; deleting a
    /// missing key is not an error.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether a live (unexpired) entry exists for the key.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Re-arms the TTL on an existing key. Returns false if the key is gone.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    /// Remaining TTL in seconds, or `None` if the key is missing.
    async fn ttl_remaining(&self, key: &str) -> Result<Option<u64>>;

    /// All live entry keys starting with `prefix`. An empty prefix lists
    /// every entry key.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Atomically adds `delta` to a counter, returning the new value.
    /// Counters start at zero.
    async fn fetch_add(&self, counter: &str, delta: i64) -> Result<i64>;

    /// Atomically replaces a counter's value if it currently equals
    /// `expected`. Returns whether the swap happened.
    async fn compare_and_swap(&self, counter: &str, expected: i64, new: i64) -> Result<bool>;
}
