//! Coupon Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::cache::{CacheKey, InvalidationFlags};
use crate::error::{ApiError, ApiResult};
use crate::models::{CouponQuery, MessageResponse, NewCouponRequest, UpdateCouponRequest};

fn invalid_id() -> ApiError {
    ApiError::BadRequest("Invalid Coupon ID".into())
}

/// Handler for POST /payment/coupon/new
pub async fn new_coupon(
    State(state): State<AppState>,
    Json(req): Json<NewCouponRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let (code, amount) = req.validate()?;
    let coupon = state
        .db
        .insert_coupon(code, amount)
        .await
        .ok_or_else(|| ApiError::BadRequest("Coupon code already exists".into()))?;
    state.invalidate(InvalidationFlags::new().coupon()).await;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Coupon {} Created Successfully",
            coupon.code
        ))),
    ))
}

/// Handler for GET /payment/coupon/discount?coupon=<code>
pub async fn apply_discount(
    State(state): State<AppState>,
    Query(query): Query<CouponQuery>,
) -> ApiResult<Json<Value>> {
    let invalid = || ApiError::BadRequest("Invalid Coupon Code".into());
    let code = query.coupon.ok_or_else(invalid)?;
    let coupon = state.db.coupon_by_code(&code).await.ok_or_else(invalid)?;

    Ok(Json(json!({ "success": true, "discount": coupon.amount })))
}

/// Handler for GET /payment/coupon/all
pub async fn all_coupons(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let coupons = state
        .cache
        .get_or_populate(&CacheKey::AllCoupons, || async {
            Ok::<_, ApiError>(state.db.all_coupons().await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "coupons": coupons })))
}

/// Handler for GET /payment/coupon/:id
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let coupon = state.db.coupon(&id).await.ok_or_else(invalid_id)?;

    Ok(Json(json!({ "success": true, "coupon": coupon })))
}

/// Handler for PUT /payment/coupon/:id
pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCouponRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let code = req.code.filter(|c| !c.trim().is_empty());
    let amount = req.amount.filter(|a| *a > 0.0);
    let coupon = state
        .db
        .update_coupon(&id, code, amount)
        .await
        .ok_or_else(invalid_id)?;
    state.invalidate(InvalidationFlags::new().coupon()).await;

    Ok(Json(MessageResponse::new(format!(
        "Coupon {} Updated Successfully",
        coupon.code
    ))))
}

/// Handler for DELETE /payment/coupon/:id
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let coupon = state.db.delete_coupon(&id).await.ok_or_else(invalid_id)?;
    state.invalidate(InvalidationFlags::new().coupon()).await;

    Ok(Json(MessageResponse::new(format!(
        "Coupon {} Deleted Successfully",
        coupon.code
    ))))
}
