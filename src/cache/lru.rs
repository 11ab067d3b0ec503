//! LRU Tracker Module
//!
//! Least-recently-used ordering for the memory backend's capacity bound.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order of keys.
///
/// Every touch stamps the key with a fresh tick; the smallest tick is the
/// least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// key -> last access tick
    ticks: HashMap<String, u64>,
    /// last access tick -> key
    order: BTreeMap<u64, String>,
    /// Monotonic access counter
    clock: u64,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.clock += 1;
        let tick = self.clock;
        if let Some(previous) = self.ticks.insert(key.to_string(), tick) {
            self.order.remove(&previous);
        }
        self.order.insert(tick, key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Returns and forgets the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Least recently used key, without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_insertion_order() {
        let mut lru = LruTracker::new();

        lru.touch("latest-products");
        lru.touch("categories");
        lru.touch("all-products");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("latest-products"));
    }

    #[test]
    fn test_lru_touch_moves_to_front() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.evict_oldest().as_deref(), Some("b"));
        assert_eq!(lru.evict_oldest().as_deref(), Some("c"));
        assert_eq!(lru.evict_oldest().as_deref(), Some("a"));
        assert!(lru.evict_oldest().is_none());
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.remove("a");
        lru.remove("missing");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.peek_oldest(), Some("b"));
    }

    #[test]
    fn test_lru_empty() {
        let mut lru = LruTracker::new();
        assert!(lru.is_empty());
        assert!(lru.evict_oldest().is_none());
    }
}
