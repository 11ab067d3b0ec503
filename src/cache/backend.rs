//! Cache Backend Trait
//!
//! The storage contract shared by the memory and Redis backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Key-value storage of serialized JSON payloads.
///
/// A missing key is never an error: `get` answers `Ok(None)` and `delete`
/// answers `Ok(false)`. Errors mean the backend itself misbehaved.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetches the payload stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous payload.
    ///
    /// `ttl = None` keeps the entry until it is invalidated.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Removes `key`, returning whether it was present.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether `key` currently holds an unexpired payload.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Drops expired entries. Backends with native expiry have nothing to do.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    /// Entries dropped to stay within capacity, for backends that count them.
    async fn evictions(&self) -> Option<u64> {
        None
    }
}
