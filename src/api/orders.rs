//! Order Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::AppState;
use crate::cache::{CacheKey, InvalidationFlags};
use crate::db::Order;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewOrderRequest, UserIdQuery};

fn order_changed(order: &Order) -> InvalidationFlags {
    InvalidationFlags::new()
        .order()
        .admin()
        .user_id(order.user.as_str())
        .order_id(order.id.as_str())
}

/// Handler for POST /order/new
///
/// Stores the order and takes the ordered quantities out of stock.
pub async fn new_order(
    State(state): State<AppState>,
    Json(req): Json<NewOrderRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let new = req.validate()?;
    let order = state.db.insert_order(new).await;

    for item in &order.order_items {
        if !state.db.reduce_stock(&item.product_id, item.quantity).await {
            warn!(order = %order.id, product = %item.product_id, "ordered product not found");
        }
    }

    let flags = InvalidationFlags::new()
        .product()
        .order()
        .admin()
        .user_id(order.user.as_str())
        .product_ids(order.order_items.iter().map(|i| i.product_id.clone()));
    state.invalidate(flags).await;
    info!(order = %order.id, user = %order.user, "order placed");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order Placed Successfully",
            "order": order,
        })),
    ))
}

/// Handler for GET /order/my?id=<user>
pub async fn my_orders(
    State(state): State<AppState>,
    Query(actor): Query<UserIdQuery>,
) -> ApiResult<Json<Value>> {
    let user = actor.require()?;
    let orders = state
        .cache
        .get_or_populate(&CacheKey::MyOrders(user.clone()), || async {
            Ok::<_, ApiError>(state.db.orders_of_user(&user).await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// Handler for GET /order/all
pub async fn all_orders(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let orders = state
        .cache
        .get_or_populate(&CacheKey::AllOrders, || async {
            Ok::<_, ApiError>(state.db.all_orders().await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// Handler for GET /order/:id
pub async fn single_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let order = state
        .cache
        .get_or_populate(&CacheKey::Order(id.clone()), || async {
            state
                .db
                .order(&id)
                .await
                .ok_or_else(|| ApiError::NotFound("Order Not Found".into()))
        })
        .await?;

    Ok(Json(json!({ "success": true, "order": order })))
}

/// Handler for PUT /order/:id
///
/// Moves the order one fulfilment stage forward.
pub async fn process_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let current = state
        .db
        .order(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Order Not Found".into()))?;
    let order = state
        .db
        .set_order_status(&id, current.status.advance())
        .await
        .ok_or_else(|| ApiError::NotFound("Order Not Found".into()))?;
    state.invalidate(order_changed(&order)).await;

    Ok(Json(json!({
        "success": true,
        "message": "Order Processed Successfully",
        "order": order,
    })))
}

/// Handler for DELETE /order/:id
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let order = state
        .db
        .delete_order(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Order Not Found".into()))?;
    state.invalidate(order_changed(&order)).await;

    Ok(Json(json!({
        "success": true,
        "message": "Order Deleted Successfully",
    })))
}
