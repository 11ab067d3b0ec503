//! User Handlers
//!
//! User reads are uncached. Creating or deleting a user changes the
//! dashboard figures, so both invalidate the admin keys.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::cache::InvalidationFlags;
use crate::error::{ApiError, ApiResult};
use crate::models::NewUserRequest;

/// Handler for POST /user/new
pub async fn new_user(
    State(state): State<AppState>,
    Json(req): Json<NewUserRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = state.db.insert_user(req.validate()?).await;
    state.invalidate(InvalidationFlags::new().admin()).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("Welcome, {}", user.name),
            "user": user,
        })),
    ))
}

/// Handler for GET /user/all
pub async fn all_users(State(state): State<AppState>) -> Json<Value> {
    let users = state.db.all_users().await;
    Json(json!({ "success": true, "users": users }))
}

/// Handler for GET /user/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = state
        .db
        .user(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Invalid Id".into()))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// Handler for DELETE /user/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .db
        .delete_user(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Invalid Id".into()))?;
    state.invalidate(InvalidationFlags::new().admin()).await;

    Ok(Json(json!({
        "success": true,
        "message": "User Deleted Successfully",
    })))
}
