//! Dashboard Handlers
//!
//! Each payload is computed over the whole database, so it is cached until
//! a write that changes the figures invalidates the admin keys.

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::cache::CacheKey;
use crate::dashboard;
use crate::error::{ApiError, ApiResult};

/// Handler for GET /dashboard/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let stats = state
        .cache
        .get_or_populate(&CacheKey::AdminStats, || async {
            Ok::<_, ApiError>(dashboard::build_stats(&state.db, Utc::now()).await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// Handler for GET /dashboard/pie
pub async fn pie_charts(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let charts = state
        .cache
        .get_or_populate(&CacheKey::AdminPieCharts, || async {
            Ok::<_, ApiError>(dashboard::build_pie_charts(&state.db, Utc::now()).await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "charts": charts })))
}

/// Handler for GET /dashboard/bar
pub async fn bar_charts(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let charts = state
        .cache
        .get_or_populate(&CacheKey::AdminBarCharts, || async {
            Ok::<_, ApiError>(dashboard::build_bar_charts(&state.db, Utc::now()).await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "charts": charts })))
}

/// Handler for GET /dashboard/line
pub async fn line_charts(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let charts = state
        .cache
        .get_or_populate(&CacheKey::AdminLineCharts, || async {
            Ok::<_, ApiError>(dashboard::build_line_charts(&state.db, Utc::now()).await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "charts": charts })))
}
