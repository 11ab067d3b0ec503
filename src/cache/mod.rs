//! Cache Module
//!
//! Read-through caching of serialized query results with explicit
//! invalidation. One backend trait, two backends (memory, Redis).

mod backend;
mod client;
mod entry;
mod invalidation;
mod keys;
mod lru;
mod memory;
mod remote;
mod stats;


// Re-export public types
pub use backend::CacheBackend;
pub use client::CacheClient;
pub use entry::CacheEntry;
pub use invalidation::{
    InvalidationCoordinator, InvalidationFlags, InvalidationReport, ListingIndex,
};
pub use keys::{CacheKey, ListingQuery, LISTING_PREFIX};
pub use lru::LruTracker;
pub use memory::{MemoryBackend, MemoryStore};
pub use remote::RedisBackend;
pub use stats::{CacheCounters, CacheStats};

use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::error::Result;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 8 * 1024 * 1024; // 8 MB

/// Builds the backend selected by configuration.
pub async fn backend_from_config(config: &Config) -> Result<Arc<dyn CacheBackend>> {
    Ok(match config.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new(config.max_entries)),
        BackendKind::Redis => {
            Arc::new(RedisBackend::connect(&config.redis_url, config.redis_pool_size).await?)
        }
    })
}
