//! Cache Client Module
//!
//! Read-through access to the configured backend. Handlers ask for a key and
//! supply the database query that produces it; the client answers from the
//! cache when it can, coalesces concurrent misses, and never lets a backend
//! failure fail the request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CacheCounters, CacheKey, CacheStats, ListingIndex};
use crate::config::Config;
use crate::error::Result;

/// Outcome of a single cache read.
enum Lookup<T> {
    Hit(T),
    Miss,
    /// Backend unreachable; do not try to populate either
    Unavailable,
}

// == Cache Client ==
/// Shared handle to the cache. Cheap to clone.
#[derive(Clone)]
pub struct CacheClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    backend: Arc<dyn CacheBackend>,
    /// TTL of every non-listing entry, None = until invalidated
    default_ttl: Option<Duration>,
    /// TTL of paginated listing entries
    listing_ttl: Duration,
    listings: ListingIndex,
    /// key -> gate held by the request currently populating it
    flights: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    counters: CacheCounters,
}

impl CacheClient {
    // == Constructor ==
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        default_ttl: Option<Duration>,
        listing_ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                backend,
                default_ttl,
                listing_ttl,
                listings: ListingIndex::new(),
                flights: Mutex::new(HashMap::new()),
                counters: CacheCounters::new(),
            }),
        }
    }

    /// Builds a client from configuration. A `cache_ttl` of zero keeps
    /// entries until they are invalidated.
    pub fn from_config(backend: Arc<dyn CacheBackend>, config: &Config) -> Self {
        let default_ttl = (config.cache_ttl > 0).then(|| Duration::from_secs(config.cache_ttl));
        Self::new(
            backend,
            default_ttl,
            Duration::from_secs(config.listing_ttl.max(1)),
        )
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    /// Capacity evictions reported by the backend, if it counts them.
    pub async fn evictions(&self) -> Option<u64> {
        self.inner.backend.evictions().await
    }

    /// Issued listing keys not yet invalidated.
    pub fn listings(&self) -> &ListingIndex {
        &self.inner.listings
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> &CacheCounters {
        &self.inner.counters
    }

    /// TTL applied when populating `key`.
    pub fn ttl_for(&self, key: &CacheKey) -> Option<Duration> {
        if key.is_listing() {
            Some(self.inner.listing_ttl)
        } else {
            self.inner.default_ttl
        }
    }

    // == Get Or Populate ==
    /// Returns the cached value for `key`, or runs `fetch` and caches its
    /// result.
    ///
    /// Concurrent misses on the same key wait for the first one's fetch and
    /// then read its result, so a burst of misses queries the database once.
    /// Errors from `fetch` are returned untouched and nothing is cached.
    pub async fn get_or_populate<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let name = key.to_string();

        match self.lookup::<T>(&name).await {
            Lookup::Hit(value) => {
                self.inner.counters.record_hit();
                debug!(key = %name, "cache hit");
                return Ok(value);
            }
            Lookup::Unavailable => return fetch().await,
            Lookup::Miss => self.inner.counters.record_miss(),
        }

        let flight = self.join_flight(&name);
        let _permit = flight.gate.lock().await;

        // Another request may have populated the key while we waited
        let second = self.lookup::<T>(&name).await;
        match second {
            Lookup::Hit(value) => {
                self.inner.counters.record_coalesced();
                debug!(key = %name, "cache miss coalesced");
                Ok(value)
            }
            Lookup::Unavailable => fetch().await,
            Lookup::Miss => {
                debug!(key = %name, "cache miss, querying database");
                let value = fetch().await?;
                self.store(key, &name, &value).await;
                Ok(value)
            }
        }
    }

    // == Exists ==
    /// Whether `key` currently holds a payload. Backend failures read as absent.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.inner
            .backend
            .exists(&key.to_string())
            .await
            .unwrap_or(false)
    }

    // == Delete ==
    /// Removes a raw key from the backend.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.backend.delete(key).await
    }

    // == Sweep ==
    /// Drops expired backend entries and listing-index records older than
    /// the listing TTL. Returns `(entries, listing_records)` removed.
    pub async fn sweep(&self) -> Result<(usize, usize)> {
        let entries = self.inner.backend.purge_expired().await?;
        let listings = self.inner.listings.prune(self.inner.listing_ttl);
        Ok((entries, listings))
    }

    async fn lookup<T: DeserializeOwned>(&self, name: &str) -> Lookup<T> {
        match self.inner.backend.get(name).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => Lookup::Hit(value),
                Err(e) => {
                    // Unreadable payload is treated as absent and overwritten
                    warn!(key = %name, error = %e, "cached payload could not be decoded");
                    self.inner.counters.record_fallthrough();
                    Lookup::Miss
                }
            },
            Ok(None) => Lookup::Miss,
            Err(e) => {
                warn!(
                    key = %name,
                    backend = self.inner.backend.name(),
                    error = %e,
                    "cache read failed, serving from database"
                );
                self.inner.counters.record_fallthrough();
                Lookup::Unavailable
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &CacheKey, name: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %name, error = %e, "payload could not be serialized, not caching");
                self.inner.counters.record_fallthrough();
                return;
            }
        };

        match self.inner.backend.set(name, &payload, self.ttl_for(key)).await {
            Ok(()) => {
                self.inner.counters.record_populated();
                if key.is_listing() {
                    self.inner.listings.record(name);
                }
            }
            Err(e) => {
                warn!(key = %name, error = %e, "cache write failed, not caching");
                self.inner.counters.record_fallthrough();
            }
        }
    }

    fn join_flight(&self, name: &str) -> Flight<'_> {
        let mut flights = self
            .inner
            .flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let gate = flights
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        Flight {
            key: name.to_string(),
            gate,
            flights: &self.inner.flights,
        }
    }

    /// Number of keys with a population in progress.
    pub fn in_flight(&self) -> usize {
        self.inner
            .flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// == Flight ==
/// Membership in the group of requests populating one key. The last member
/// to leave removes the gate.
struct Flight<'a> {
    key: String,
    gate: Arc<AsyncMutex<()>>,
    flights: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        let last_member = flights
            .get(&self.key)
            .map(|gate| Arc::ptr_eq(gate, &self.gate) && Arc::strong_count(&self.gate) == 2)
            .unwrap_or(false);
        if last_member {
            flights.remove(&self.key);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::db::SortOrder;
    use crate::cache::ListingQuery;
    use crate::error::CacheError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memory_client() -> CacheClient {
        CacheClient::new(
            Arc::new(MemoryBackend::new(100)),
            Some(Duration::from_secs(3600)),
            Duration::from_secs(30),
        )
    }

    /// Backend whose every call fails, as an unreachable Redis would.
    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CacheError::Configuration("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
            Err(CacheError::Configuration("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<bool> {
            Err(CacheError::Configuration("connection refused".into()))
        }
        async fn exists(&self, _key: &str) -> Result<bool> {
            Err(CacheError::Configuration("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = memory_client();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_populate(&CacheKey::Categories, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(vec!["laptop".to_string(), "camera".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["laptop", "camera"]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.populated, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let cache = memory_client();
        let key = CacheKey::Product("missing".into());

        let result: std::result::Result<String, &str> =
            cache.get_or_populate(&key, || async { Err("Product Not Found") }).await;

        assert_eq!(result, Err("Product Not Found"));
        assert!(!cache.contains(&key).await);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_falls_through() {
        let cache = CacheClient::new(Arc::new(BrokenBackend), None, Duration::from_secs(30));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .get_or_populate(&CacheKey::AdminStats, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().fallthroughs, 2);
        assert_eq!(cache.stats().populated, 0);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_repopulated() {
        let backend = Arc::new(MemoryBackend::new(10));
        backend.set("all-orders", "{not json", None).await.unwrap();
        let cache = CacheClient::new(backend.clone(), None, Duration::from_secs(30));

        let value: Vec<u32> = cache
            .get_or_populate(&CacheKey::AllOrders, || async { Ok::<_, CacheError>(vec![1, 2]) })
            .await
            .unwrap();

        assert_eq!(value, vec![1, 2]);
        assert_eq!(backend.get("all-orders").await.unwrap().as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_listing_population_is_indexed() {
        let cache = memory_client();
        let query = ListingQuery {
            sort: Some(SortOrder::Asc),
            ..ListingQuery::default()
        };
        let key = CacheKey::Listing(query);

        let _: Vec<u32> = cache
            .get_or_populate(&key, || async { Ok::<_, CacheError>(vec![]) })
            .await
            .unwrap();

        assert_eq!(cache.ttl_for(&key), Some(Duration::from_secs(30)));
        assert_eq!(cache.ttl_for(&CacheKey::Categories), Some(Duration::from_secs(3600)));
        assert_eq!(cache.listings().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let cache = memory_client();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_populate(&CacheKey::AdminBarCharts, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, CacheError>(vec![0u64, 1, 2, 3, 4, 5])
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let value = task.await.unwrap().unwrap();
            assert_eq!(value.len(), 6);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight(), 0);
        let stats = cache.stats();
        assert_eq!(stats.populated, 1);
        assert_eq!(stats.hits + stats.coalesced, 7);
    }

    #[tokio::test]
    async fn test_round_trip_is_byte_identical_until_expiry() {
        let backend = Arc::new(MemoryBackend::new(10));
        let cache = CacheClient::new(
            backend.clone(),
            Some(Duration::from_millis(60)),
            Duration::from_secs(30),
        );
        let payload = serde_json::json!({"products": [{"name": "mug", "price": 12.5}], "totalPage": 1});

        let _: serde_json::Value = cache
            .get_or_populate(&CacheKey::AllProducts, || async {
                Ok::<_, CacheError>(payload.clone())
            })
            .await
            .unwrap();

        let stored = backend.get("all-products").await.unwrap().unwrap();
        assert_eq!(stored, serde_json::to_string(&payload).unwrap());

        tokio::time::sleep(Duration::from_millis(90)).await;
        assert!(backend.get("all-products").await.unwrap().is_none());
    }
}
