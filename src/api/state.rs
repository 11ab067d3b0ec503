//! Application state shared across all handlers.

use std::sync::Arc;

use crate::cache::{
    CacheBackend, CacheClient, InvalidationCoordinator, InvalidationFlags, InvalidationReport,
    MemoryBackend,
};
use crate::config::Config;
use crate::db::Database;

/// Everything a handler needs: the document store, the cache in front of it
/// and the coordinator that keeps the two consistent after writes.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cache: CacheClient,
    pub invalidator: InvalidationCoordinator,
    /// Page size of the product listing
    pub products_per_page: usize,
}

impl AppState {
    pub fn new(db: Arc<Database>, cache: CacheClient, products_per_page: usize) -> Self {
        Self {
            invalidator: InvalidationCoordinator::new(cache.clone()),
            db,
            cache,
            products_per_page: products_per_page.max(1),
        }
    }

    /// Wires the state from configuration around an already built backend.
    pub fn from_config(db: Arc<Database>, backend: Arc<dyn CacheBackend>, config: &Config) -> Self {
        let cache = CacheClient::from_config(backend, config);
        Self::new(db, cache, config.products_per_page)
    }

    /// Empty database behind a process-local cache with default settings.
    pub fn in_memory() -> Self {
        let config = Config::default();
        let backend = Arc::new(MemoryBackend::new(config.max_entries));
        Self::from_config(Arc::new(Database::new()), backend, &config)
    }

    /// Drops the cache keys a committed write made stale.
    pub async fn invalidate(&self, flags: InvalidationFlags) -> InvalidationReport {
        self.invalidator.invalidate(&flags).await
    }
}
