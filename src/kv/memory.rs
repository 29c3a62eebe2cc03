//! In-Memory KV Adapter
//!
//! Reference [`KvStore`] implementation with per-entry TTL bookkeeping. Entries
//! expire lazily on read; [`MemoryKv::purge_expired`] (or the background task
//! in [`crate::tasks`]) reclaims the rest.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::kv::KvStore;

// == Stored Value ==
/// A value plus its expiration deadline (Unix milliseconds).
#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    expires_at: i64,
}

impl StoredValue {
    fn new(bytes: Vec<u8>, ttl_seconds: u64) -> Self {
        Self {
            bytes,
            expires_at: now_ms() + (ttl_seconds as i64) * 1000,
        }
    }

    /// An entry is expired once the deadline has fully elapsed.
    fn is_expired(&self) -> bool {
        now_ms() >= self.expires_at
    }

    fn ttl_remaining_secs(&self) -> u64 {
        let remaining = self.expires_at - now_ms();
        if remaining > 0 {
            (remaining / 1000) as u64
        } else {
            0
        }
    }
}

/// Current Unix timestamp in milliseconds.
fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// == Memory KV ==
/// In-memory key-value backend with TTL support.
///
/// Entry keys and counters live in separate maps, so prefix scans only ever
/// see entry keys.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, StoredValue>>,
    counters: RwLock<HashMap<String, i64>>,
}

impl MemoryKv {
    // == Constructor ==
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    // == Purge Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, value| !value.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|v| !v.is_expired()).count()
    }

    /// Whether no live entries exist.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(value) if value.is_expired() => {
                // Lazy expiry: reclaim on read
                entries.remove(key);
                Ok(None)
            }
            Some(value) => Ok(Some(value.bytes.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), StoredValue::new(value, ttl_seconds));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(value) => Ok(!value.is_expired()),
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|v| !v.is_expired()).unwrap_or(false))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(value) if !value.is_expired() => {
                value.expires_at = now_ms() + (ttl_seconds as i64) * 1000;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl_remaining(&self, key: &str) -> Result<Option<u64>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|v| !v.is_expired())
            .map(|v| v.ttl_remaining_secs()))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, value)| key.starts_with(prefix) && !value.is_expired())
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn fetch_add(&self, counter: &str, delta: i64) -> Result<i64> {
        let mut counters = self.counters.write().await;
        let value = counters.entry(counter.to_string()).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn compare_and_swap(&self, counter: &str, expected: i64, new: i64) -> Result<bool> {
        let mut counters = self.counters.write().await;
        let value = counters.entry(counter.to_string()).or_insert(0);
        if *value == expected {
            *value = new;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
