//! Memory Backend Module
//!
//! Process-local cache backend: HashMap storage with LRU tracking and TTL
//! expiration. Contents are lost on restart.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheBackend, CacheEntry, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// Synchronous storage core of the memory backend.
#[derive(Debug)]
pub struct MemoryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Entries dropped to respect `max_entries`
    evictions: u64,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries: max_entries.max(1),
            evictions: 0,
        }
    }

    // == Set ==
    /// Stores a payload, overwriting any previous one and resetting its TTL.
    ///
    /// If the store is at capacity, the least recently used entry is evicted.
    pub fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key must be 1..={} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let is_overwrite = self.entries.contains_key(key);

        // Prefer reclaiming expired space before evicting live entries
        if !is_overwrite && self.entries.len() >= self.max_entries {
            self.cleanup_expired();
        }

        while !is_overwrite && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                    self.evictions += 1;
                    debug!(key = %evicted, "memory cache evicted entry");
                }
                None => break,
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        self.lru.touch(key);

        Ok(())
    }

    // == Get ==
    /// Returns the payload if present and unexpired.
    ///
    /// Expired entries are removed on sight.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = self.entries.get(key)?.is_expired();
        if expired {
            self.remove(key);
            return None;
        }

        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) -> bool {
        let live = self
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false);
        self.remove(key);
        live
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.lru.remove(key);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove(key);
        }

        expired_keys.len()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Memory Backend ==
/// `CacheBackend` over a lock-guarded `MemoryStore`.
#[derive(Debug)]
pub struct MemoryBackend {
    store: RwLock<MemoryStore>,
}

impl MemoryBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: RwLock::new(MemoryStore::new(max_entries)),
        }
    }

    /// Number of stored entries, expired ones included until swept.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: reads update LRU order and drop expired entries
        Ok(self.store.write().await.get(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.store.write().await.set(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.store.write().await.delete(key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.read().await.exists(key))
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(self.store.write().await.cleanup_expired())
    }

    async fn evictions(&self) -> Option<u64> {
        Some(self.store.read().await.evictions())
    }
}
