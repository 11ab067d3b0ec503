//! Operational Handlers

use axum::{extract::State, Json};

use crate::api::AppState;
use crate::models::{CacheStatsResponse, HealthResponse};

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /cache/stats
///
/// Counters of the cache client since startup.
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        success: true,
        backend: state.cache.backend_name(),
        tracked_listings: state.cache.listings().len(),
        evictions: state.cache.evictions().await,
        stats: state.cache.stats(),
    })
}
