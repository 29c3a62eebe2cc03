//! Expired-Entry Purge Task
//!
//! Background task that periodically removes expired entries from a
//! [`MemoryKv`]. The in-memory backend expires lazily on read; entries nobody
//! reads again would otherwise linger until evicted.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::kv::MemoryKv;

/// Spawns a background task that periodically purges expired entries.
///
/// The task loops forever, sleeping for the given interval between purge
/// runs. Abort the returned handle for shutdown.
pub fn spawn_purge_task(kv: Arc<MemoryKv>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "starting expired-entry purge task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = kv.purge_expired().await;
            if removed > 0 {
                info!(removed, "purged expired cache entries");
            } else {
                debug!("purge found no expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvStore;

    #[tokio::test]
    async fn test_purge_task_removes_expired_entries() {
        let kv = Arc::new(MemoryKv::new());
        kv.set("expire-soon", b"v".to_vec(), 1).await.unwrap();

        let handle = spawn_purge_task(kv.clone(), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(kv.len().await, 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_preserves_live_entries() {
        let kv = Arc::new(MemoryKv::new());
        kv.set("long-lived", b"v".to_vec(), 3600).await.unwrap();

        let handle = spawn_purge_task(kv.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(kv.exists("long-lived").await.unwrap());
        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_can_be_aborted() {
        let kv = Arc::new(MemoryKv::new());

        let handle = spawn_purge_task(kv, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }
}
