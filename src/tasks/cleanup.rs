//! Cache Sweep Task
//!
//! Background task that periodically removes expired cache entries and
//! forgets listing keys that have outlived their TTL.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheClient;

/// Spawns a background task that sweeps the cache every `interval_secs`.
///
/// Returns the task handle so the caller can abort it on shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(cache.clone(), 5);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: CacheClient, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            backend = cache.backend_name(),
            "Starting cache sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.sweep().await {
                Ok((0, 0)) => debug!("Cache sweep: nothing to remove"),
                Ok((entries, listings)) => info!(
                    entries,
                    listings, "Cache sweep: removed expired entries and stale listing keys"
                ),
                Err(e) => warn!(error = %e, "Cache sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::{CacheKey, ListingQuery, MemoryBackend};
    use crate::error::CacheError;

    fn client(backend: Arc<MemoryBackend>, ttl: Duration) -> CacheClient {
        CacheClient::new(backend, Some(ttl), ttl)
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let backend = Arc::new(MemoryBackend::new(100));
        let cache = client(backend.clone(), Duration::from_millis(200));

        cache
            .get_or_populate(&CacheKey::Categories, || async {
                Ok::<_, CacheError>(vec!["books".to_string()])
            })
            .await
            .unwrap();
        assert_eq!(backend.len().await, 1);

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(backend.len().await, 0, "expired entry should be swept");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_forgets_stale_listing_keys() {
        let backend = Arc::new(MemoryBackend::new(100));
        let cache = client(backend, Duration::from_millis(200));
        let key = CacheKey::Listing(ListingQuery::default());

        cache
            .get_or_populate(&key, || async { Ok::<_, CacheError>(1u32) })
            .await
            .unwrap();
        assert_eq!(cache.listings().len(), 1);

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(cache.listings().is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_preserves_live_entries() {
        let backend = Arc::new(MemoryBackend::new(100));
        let cache = client(backend.clone(), Duration::from_secs(3600));

        cache
            .get_or_populate(&CacheKey::AllProducts, || async {
                Ok::<_, CacheError>(Vec::<String>::new())
            })
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(cache.contains(&CacheKey::AllProducts).await);
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = client(Arc::new(MemoryBackend::new(10)), Duration::from_secs(1));
        let handle = spawn_cleanup_task(cache, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
