//! Eviction Policy Module
//!
//! Keeps the cached population within the configured capacity. Two
//! strategies: a per-type oldest-TTL scan that evicts one entry per insert at
//! capacity, and a batched sweep that amortizes eviction cost across many
//! inserts at the price of transient overshoot.

use tracing::{debug, info};

use crate::cache::entry::CacheEntry;
use crate::cache::key::CacheKey;
use crate::config::{Config, EvictionStrategy};
use crate::error::Result;
use crate::kv::KvStore;

// == Constants ==
/// Counter tracking inserts since the last batched sweep. Lives in the KV
/// backend so it survives restarts and is shared by all cache writers.
pub const INSERT_COUNTER: &str = "eviction:inserts";

// == Eviction Policy ==
/// Capacity enforcement, triggered synchronously on every insert that would
/// grow the cache.
#[derive(Debug, Clone)]
pub struct EvictionPolicy {
    strategy: EvictionStrategy,
    max_count: usize,
    check_frequency: usize,
}

impl EvictionPolicy {
    // == Constructor ==
    pub fn new(strategy: EvictionStrategy, max_count: usize, check_frequency: usize) -> Self {
        Self {
            strategy,
            max_count,
            check_frequency,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.strategy, config.max_count, config.check_frequency)
    }

    // == Pre-Insert Check ==
    /// Runs the configured strategy before an insert grows the cache.
    ///
    /// Called before the new entry is written, so the entry that triggered
    /// the check is never an eviction candidate. Returns the number of
    /// entries deleted.
    pub async fn before_insert<K>(&self, kv: &K, entity_type: &str) -> Result<u64>
    where
        K: KvStore + ?Sized,
    {
        match self.strategy {
            EvictionStrategy::OldestTtl => self.evict_oldest_ttl(kv, entity_type).await,
            EvictionStrategy::Batched => self.batched_check(kv).await,
        }
    }

    // == Oldest-TTL Strategy ==
    /// At or above capacity for the type, delete the single key with the
    /// smallest remaining TTL.
    async fn evict_oldest_ttl<K>(&self, kv: &K, entity_type: &str) -> Result<u64>
    where
        K: KvStore + ?Sized,
    {
        let prefix = CacheKey::prefix_for(entity_type);
        let keys = kv.keys_with_prefix(&prefix).await?;
        if keys.len() < self.max_count {
            return Ok(0);
        }

        // O(n) TTL queries; keys that vanish mid-scan are skipped
        let mut candidate: Option<(String, u64)> = None;
        for key in keys {
            let Some(remaining) = kv.ttl_remaining(&key).await? else {
                continue;
            };
            match &candidate {
                Some((_, min)) if remaining >= *min => {}
                _ => candidate = Some((key, remaining)),
            }
        }

        let Some((key, remaining)) = candidate else {
            return Ok(0);
        };
        let deleted = kv.delete(&key).await?;
        debug!(%key, ttl_remaining = remaining, "evicted oldest-ttl entry");
        Ok(u64::from(deleted))
    }

    // == Batched Strategy ==
    /// Counts inserts in the KV backend; at `max_count + check_frequency`,
    /// one caller claims the sweep via compare-and-swap and deletes the
    /// `check_frequency` oldest entries globally.
    async fn batched_check<K>(&self, kv: &K) -> Result<u64>
    where
        K: KvStore + ?Sized,
    {
        let count = kv.fetch_add(INSERT_COUNTER, 1).await?;
        let threshold = (self.max_count + self.check_frequency) as i64;
        if count < threshold {
            return Ok(0);
        }

        // The CAS both claims the sweep and defers the next one by
        // check_frequency inserts. A racer that loses the swap does nothing;
        // the counter keeps climbing until someone wins.
        let claimed = kv
            .compare_and_swap(INSERT_COUNTER, count, -(self.check_frequency as i64))
            .await?;
        if !claimed {
            return Ok(0);
        }

        self.sweep(kv).await
    }

    /// Deletes the `check_frequency` oldest entries by embedded insertion
    /// timestamp.
    async fn sweep<K>(&self, kv: &K) -> Result<u64>
    where
        K: KvStore + ?Sized,
    {
        let keys = kv.keys_with_prefix("").await?;

        let mut aged: Vec<(i64, String)> = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(bytes) = kv.get(&key).await? else {
                continue;
            };
            // Entries that fail to decode sort newest: never delete what
            // cannot be age-ranked ahead of what can.
            let inserted_at = CacheEntry::decode(&bytes)
                .map(|entry| entry.inserted_at)
                .unwrap_or(i64::MAX);
            aged.push((inserted_at, key));
        }
        aged.sort();

        let mut deleted = 0u64;
        for (_, key) in aged.into_iter().take(self.check_frequency) {
            if kv.delete(&key).await? {
                deleted += 1;
            }
        }

        info!(deleted, batch = self.check_frequency, "batched eviction sweep");
        Ok(deleted)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::store::EntityId;

    fn entry_bytes(attributes_hint: &str, inserted_at: i64) -> Vec<u8> {
        let mut entry = CacheEntry::new(
            [(
                "hint".to_string(),
                serde_json::Value::String(attributes_hint.to_string()),
            )]
            .into_iter()
            .collect(),
        );
        entry.inserted_at = inserted_at;
        entry.encode().unwrap()
    }

    async fn insert(kv: &MemoryKv, entity_type: &str, id: i64, ttl: u64, inserted_at: i64) {
        let key = CacheKey::encode(entity_type, &EntityId::Int(id));
        kv.set(key.as_str(), entry_bytes("x", inserted_at), ttl)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_oldest_ttl_below_capacity_is_noop() {
        let kv = MemoryKv::new();
        let policy = EvictionPolicy::new(EvictionStrategy::OldestTtl, 3, 0);

        insert(&kv, "Point", 1, 10, 1).await;
        insert(&kv, "Point", 2, 20, 2).await;

        let evicted = policy.before_insert(&kv, "Point").await.unwrap();
        assert_eq!(evicted, 0);
        assert_eq!(kv.len().await, 2);
    }

    #[tokio::test]
    async fn test_oldest_ttl_evicts_minimum_remaining_ttl() {
        let kv = MemoryKv::new();
        let policy = EvictionPolicy::new(EvictionStrategy::OldestTtl, 2, 0);

        insert(&kv, "Point", 1, 10, 1).await;
        insert(&kv, "Point", 2, 20, 2).await;

        let evicted = policy.before_insert(&kv, "Point").await.unwrap();
        assert_eq!(evicted, 1);

        let key1 = CacheKey::encode("Point", &EntityId::Int(1));
        let key2 = CacheKey::encode("Point", &EntityId::Int(2));
        assert!(!kv.exists(key1.as_str()).await.unwrap());
        assert!(kv.exists(key2.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn test_oldest_ttl_scopes_to_entity_type() {
        let kv = MemoryKv::new();
        let policy = EvictionPolicy::new(EvictionStrategy::OldestTtl, 2, 0);

        insert(&kv, "Point", 1, 5, 1).await;
        insert(&kv, "Student", 1, 10, 2).await;
        insert(&kv, "Student", 2, 20, 3).await;

        // Student is at capacity; the short-TTL Point entry is not a candidate
        let evicted = policy.before_insert(&kv, "Student").await.unwrap();
        assert_eq!(evicted, 1);

        let point = CacheKey::encode("Point", &EntityId::Int(1));
        let student1 = CacheKey::encode("Student", &EntityId::Int(1));
        assert!(kv.exists(point.as_str()).await.unwrap());
        assert!(!kv.exists(student1.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn test_batched_defers_until_threshold() {
        let kv = MemoryKv::new();
        let policy = EvictionPolicy::new(EvictionStrategy::Batched, 3, 2);

        insert(&kv, "Point", 1, 300, 10).await;
        insert(&kv, "Point", 2, 300, 20).await;

        // Threshold is max_count + check_frequency = 5 inserts
        for _ in 0..4 {
            let evicted = policy.before_insert(&kv, "Point").await.unwrap();
            assert_eq!(evicted, 0);
        }
        assert_eq!(kv.len().await, 2);
    }

    #[tokio::test]
    async fn test_batched_sweep_deletes_oldest_batch() {
        let kv = MemoryKv::new();
        let policy = EvictionPolicy::new(EvictionStrategy::Batched, 3, 2);

        insert(&kv, "Point", 1, 300, 10).await;
        insert(&kv, "Point", 2, 300, 20).await;
        insert(&kv, "Point", 3, 300, 30).await;
        insert(&kv, "Point", 4, 300, 40).await;
        insert(&kv, "Point", 5, 300, 50).await;

        // Fifth increment crosses the threshold and sweeps
        let mut evicted_total = 0;
        for _ in 0..5 {
            evicted_total += policy.before_insert(&kv, "Point").await.unwrap();
        }
        assert_eq!(evicted_total, 2);

        // The two oldest timestamps are gone, the rest remain
        for (id, alive) in [(1, false), (2, false), (3, true), (4, true), (5, true)] {
            let key = CacheKey::encode("Point", &EntityId::Int(id));
            assert_eq!(kv.exists(key.as_str()).await.unwrap(), alive, "id {}", id);
        }

        // Counter was reset to -check_frequency by the sweep claim
        assert_eq!(kv.fetch_add(INSERT_COUNTER, 0).await.unwrap(), -2);
    }

    #[tokio::test]
    async fn test_batched_sweep_tolerates_fewer_keys_than_batch() {
        let kv = MemoryKv::new();
        let policy = EvictionPolicy::new(EvictionStrategy::Batched, 0, 5);

        insert(&kv, "Point", 1, 300, 10).await;

        let mut evicted_total = 0;
        for _ in 0..5 {
            evicted_total += policy.before_insert(&kv, "Point").await.unwrap();
        }
        // Sweep wanted 5, only 1 existed; that is not an error
        assert_eq!(evicted_total, 1);
        assert_eq!(kv.len().await, 0);
    }
}
