//! Configuration Module
//!
//! Handles loading server and cache configuration from environment variables.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// A configuration variable that is set but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {name}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub reason: String,
}

/// Which cache backend the process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local store, lost on restart
    Memory,
    /// Networked Redis store, shared across instances
    Redis,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-process" => Ok(BackendKind::Memory),
            "redis" => Ok(BackendKind::Redis),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache backend selection
    pub backend: BackendKind,
    /// Redis connection string (redis backend only)
    pub redis_url: String,
    /// Redis connection pool size
    pub redis_pool_size: usize,
    /// Default TTL in seconds applied to every populated entry
    pub cache_ttl: u64,
    /// TTL in seconds for paginated product listing entries
    pub listing_ttl: u64,
    /// Maximum number of entries held by the memory backend
    pub max_entries: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Page size of the product listing endpoint
    pub products_per_page: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Redis connection string (default: redis://127.0.0.1:6379)
    /// - `REDIS_POOL_SIZE` - Pooled connections (default: 8)
    /// - `CACHE_TTL` - Default TTL in seconds (default: 14400)
    /// - `LISTING_TTL` - Listing TTL in seconds (default: 30)
    /// - `MAX_ENTRIES` - Memory backend capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 5)
    /// - `PRODUCT_PER_PAGE` - Listing page size (default: 8)
    /// - `PORT` - HTTP server port (default: 3000)
    ///
    /// An unrecognised `CACHE_BACKEND` is an error rather than a silent
    /// fallback to the memory backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            backend: backend_kind(env::var("CACHE_BACKEND").ok())?
                .unwrap_or(defaults.backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            redis_pool_size: parse_var("REDIS_POOL_SIZE").unwrap_or(defaults.redis_pool_size),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            listing_ttl: parse_var("LISTING_TTL").unwrap_or(defaults.listing_ttl),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            products_per_page: parse_var("PRODUCT_PER_PAGE")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.products_per_page),
            server_port: parse_var("PORT").unwrap_or(defaults.server_port),
        })
    }
}

fn backend_kind(value: Option<String>) -> Result<Option<BackendKind>, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => v.parse::<BackendKind>().map(Some).map_err(|reason| ConfigError {
            name: "CACHE_BACKEND",
            reason,
        }),
        _ => Ok(None),
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_pool_size: 8,
            cache_ttl: 4 * 60 * 60,
            listing_ttl: 30,
            max_entries: 10_000,
            cleanup_interval: 5,
            products_per_page: 8,
            server_port: 3000,
        }
    }
}
