//! Response DTOs for the storefront API
//!
//! Most handlers answer with an ad-hoc `{"success": true, ...}` object; the
//! types here are the payloads that are cached or shared between handlers.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::db::Product;

/// One page of the product listing, cached as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_page: usize,
}

impl ProductPage {
    /// Wraps a page of products, with `matched` products over all pages.
    pub fn new(products: Vec<Product>, matched: usize, per_page: usize) -> Self {
        Self {
            products,
            total_page: matched.div_ceil(per_page.max(1)),
        }
    }
}

/// Plain acknowledgement of a write.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub success: bool,
    pub backend: &'static str,
    /// Listing keys currently tracked for invalidation
    pub tracked_listings: usize,
    /// Omitted for backends that do not count evictions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evictions: Option<u64>,
    pub stats: CacheStats,
}
