//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

// == Eviction Strategy ==
/// Capacity enforcement strategy, chosen at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionStrategy {
    /// On every insert at capacity, scan the type's keys and delete the one
    /// with the smallest remaining TTL. O(n) TTL queries per eviction.
    OldestTtl,
    /// Count inserts in the KV backend and run one batched sweep when the
    /// counter crosses `max_count + check_frequency`, deleting the
    /// `check_frequency` oldest entries globally.
    Batched,
}

impl EvictionStrategy {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "oldest-ttl" | "oldest_ttl" => Some(Self::OldestTtl),
            "batched" => Some(Self::Batched),
            _ => None,
        }
    }
}

// == Refresh Mode ==
/// How the cache entry is refreshed after a write-through update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Re-serialize the handle's snapshot over the existing entry.
    Overwrite,
    /// Re-fetch the canonical record from the durable store and re-insert it.
    Refetch,
}

impl RefreshMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "overwrite" => Some(Self::Overwrite),
            "refetch" => Some(Self::Refetch),
            _ => None,
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity ceiling enforced by the eviction policy
    pub max_count: usize,
    /// Entry freshness window in seconds
    pub ttl_seconds: u64,
    /// Batch size (and counter slack) for the batched eviction strategy
    pub check_frequency: usize,
    /// Which eviction strategy enforces `max_count`
    pub strategy: EvictionStrategy,
    /// How cache entries are refreshed after write-through updates
    pub refresh: RefreshMode,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_COUNT` - Capacity ceiling (default: 1000)
    /// - `CACHE_TTL_SECONDS` - Entry TTL in seconds (default: 300)
    /// - `CACHE_CHECK_FREQUENCY` - Batched sweep size (default: 100)
    /// - `CACHE_EVICTION_STRATEGY` - `oldest-ttl` or `batched` (default: oldest-ttl)
    /// - `CACHE_REFRESH_MODE` - `overwrite` or `refetch` (default: overwrite)
    pub fn from_env() -> Self {
        Self {
            max_count: env::var("CACHE_MAX_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            check_frequency: env::var("CACHE_CHECK_FREQUENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            strategy: env::var("CACHE_EVICTION_STRATEGY")
                .ok()
                .and_then(|v| EvictionStrategy::parse(&v))
                .unwrap_or(EvictionStrategy::OldestTtl),
            refresh: env::var("CACHE_REFRESH_MODE")
                .ok()
                .and_then(|v| RefreshMode::parse(&v))
                .unwrap_or(RefreshMode::Overwrite),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_count: 1000,
            ttl_seconds: 300,
            check_frequency: 100,
            strategy: EvictionStrategy::OldestTtl,
            refresh: RefreshMode::Overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_count, 1000);
        assert_eq!(config.ttl_seconds, 300);
        assert_eq!(config.check_frequency, 100);
        assert_eq!(config.strategy, EvictionStrategy::OldestTtl);
        assert_eq!(config.refresh, RefreshMode::Overwrite);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            EvictionStrategy::parse("oldest-ttl"),
            Some(EvictionStrategy::OldestTtl)
        );
        assert_eq!(
            EvictionStrategy::parse("oldest_ttl"),
            Some(EvictionStrategy::OldestTtl)
        );
        assert_eq!(
            EvictionStrategy::parse("batched"),
            Some(EvictionStrategy::Batched)
        );
        assert_eq!(EvictionStrategy::parse("lru"), None);
    }

    #[test]
    fn test_refresh_mode_parse() {
        assert_eq!(RefreshMode::parse("overwrite"), Some(RefreshMode::Overwrite));
        assert_eq!(RefreshMode::parse("refetch"), Some(RefreshMode::Refetch));
        assert_eq!(RefreshMode::parse("invalidate"), None);
    }
}
