//! Remote Backend Module
//!
//! Networked cache backend shared across instances. Expiry is delegated to
//! Redis itself (`SET ... PX`).

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use tracing::info;

use crate::cache::CacheBackend;
use crate::error::{CacheError, Result};

/// Redis-backed cache.
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Wraps an existing connection pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a pool for `url` and checks the server answers `PING`.
    pub async fn connect(url: &str, pool_size: usize) -> Result<Self> {
        info!("Creating Redis connection pool for cache...");

        let pool = Config::from_url(url)
            .builder()
            .map_err(|e| CacheError::Configuration(format!("Invalid Redis config: {}", e)))?
            .max_size(pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| CacheError::Configuration(format!("Failed to create pool: {}", e)))?;

        let mut conn = pool.get().await?;
        redis::cmd("PING").query_async::<String>(&mut *conn).await?;

        info!("Redis connection pool created successfully");

        Ok(Self::new(pool))
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

/// Milliseconds to pass to `PX`; Redis rejects a zero expiry.
fn expiry_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(expiry_millis(ttl));
        }
        cmd.query_async::<()>(&mut *conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_millis_never_zero() {
        assert_eq!(expiry_millis(Duration::ZERO), 1);
        assert_eq!(expiry_millis(Duration::from_secs(30)), 30_000);
        assert_eq!(expiry_millis(Duration::from_secs(14_400)), 14_400_000);
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = RedisBackend::connect("not a url", 2).await;
        assert!(result.is_err());
    }
}
