//! Cache Statistics Module
//!
//! Counters kept by the cache client: hits, misses, coalesced waits,
//! fall-throughs on backend failure, and invalidated keys.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to query the database
    pub misses: u64,
    /// Misses answered by another request's in-flight population
    pub coalesced: u64,
    /// Payloads written to the cache
    pub populated: u64,
    /// Backend or payload failures that bypassed the cache
    pub fallthroughs: u64,
    /// Keys removed by invalidation
    pub invalidated: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

// == Counters ==
/// Lock-free counters shared by all clones of a cache client.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    populated: AtomicU64,
    fallthroughs: AtomicU64,
    invalidated: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A waiter found the value populated by the request it waited on.
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_populated(&self) {
        self.populated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallthrough(&self) {
        self.fallthroughs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidated(&self, count: u64) {
        self.invalidated.fetch_add(count, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            coalesced: self.coalesced.load(Ordering::Relaxed),
            populated: self.populated.load(Ordering::Relaxed),
            fallthroughs: self.fallthroughs.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = CacheCounters::new().snapshot();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate() {
        let counters = CacheCounters::new();
        for _ in 0..3 {
            counters.record_hit();
        }
        counters.record_miss();

        let stats = counters.snapshot();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalidated_accumulates() {
        let counters = CacheCounters::new();
        counters.record_invalidated(4);
        counters.record_invalidated(3);
        assert_eq!(counters.snapshot().invalidated, 7);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let counters = CacheCounters::new();
        counters.record_fallthrough();
        let json = serde_json::to_value(counters.snapshot()).unwrap();
        assert_eq!(json["fallthroughs"], 1);
        assert!(json.get("hitRate").is_some());
    }
}
