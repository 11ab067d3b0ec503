//! Product Handlers
//!
//! Catalog reads go through the cache; every catalog write invalidates the
//! product keys, the tracked listing pages and the dashboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::AppState;
use crate::cache::{CacheKey, InvalidationFlags, ListingQuery};
use crate::db::ProductFilter;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    NewProductRequest, NewReviewRequest, ProductPage, UpdateProductRequest, UserIdQuery,
};

/// Number of products on the storefront landing page.
pub const LATEST_LIMIT: usize = 5;

fn catalog_changed(product_id: &str) -> InvalidationFlags {
    InvalidationFlags::new()
        .product()
        .admin()
        .product_id(product_id)
}

// == Reads ==
/// Handler for GET /product/latest
pub async fn latest_products(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let products = state
        .cache
        .get_or_populate(&CacheKey::LatestProducts, || async {
            Ok::<_, ApiError>(state.db.latest_products(LATEST_LIMIT).await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "products": products })))
}

/// Handler for GET /product/categories
pub async fn categories(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let categories = state
        .cache
        .get_or_populate(&CacheKey::Categories, || async {
            Ok::<_, ApiError>(state.db.categories().await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "categories": categories })))
}

/// Handler for GET /product/admin-products
pub async fn admin_products(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let products = state
        .cache
        .get_or_populate(&CacheKey::AllProducts, || async {
            Ok::<_, ApiError>(state.db.all_products().await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "products": products })))
}

/// Handler for GET /product/all
///
/// Filtered, sorted and paginated listing. Pages are cached briefly under a
/// key derived from the whole query.
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Value>> {
    let query = query.normalized();
    let per_page = state.products_per_page;
    let key = CacheKey::Listing(query.clone());

    let page = state
        .cache
        .get_or_populate(&key, || async {
            let filter = ProductFilter {
                search: query.search.clone(),
                category: query.category.clone(),
                max_price: query.price.map(|p| p as f64),
                sort: query.sort,
            };
            let skip = (query.page as usize - 1) * per_page;
            let (products, matched) = state.db.list_products(&filter, skip, per_page).await;
            Ok::<_, ApiError>(ProductPage::new(products, matched, per_page))
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "products": page.products,
        "totalPage": page.total_page,
    })))
}

/// Handler for GET /product/:id
///
/// A missing product is a 404 and is not cached.
pub async fn single_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let product = state
        .cache
        .get_or_populate(&CacheKey::Product(id.clone()), || async {
            state
                .db
                .product(&id)
                .await
                .ok_or_else(|| ApiError::NotFound("Product Not Found".into()))
        })
        .await?;

    Ok(Json(json!({ "success": true, "product": product })))
}

/// Handler for GET /product/reviews/:id
pub async fn reviews_of_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let reviews = state
        .cache
        .get_or_populate(&CacheKey::Reviews(id.clone()), || async {
            Ok::<_, ApiError>(state.db.reviews_of_product(&id).await)
        })
        .await?;

    Ok(Json(json!({ "success": true, "reviews": reviews })))
}

// == Writes ==
/// Handler for POST /product/new
pub async fn new_product(
    State(state): State<AppState>,
    Json(req): Json<NewProductRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let new = req.validate()?;
    let product = state.db.insert_product(new).await;
    state.invalidate(catalog_changed(&product.id)).await;
    info!(product = %product.id, "product created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product Created Successfully",
            "product": product,
        })),
    ))
}

/// Handler for PUT /product/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Value>> {
    let product = state
        .db
        .update_product(&id, req.into())
        .await
        .ok_or_else(|| ApiError::NotFound("Invalid Product Id".into()))?;
    state.invalidate(catalog_changed(&product.id)).await;

    Ok(Json(json!({
        "success": true,
        "message": "Product Updated Successfully",
        "product": product,
    })))
}

/// Handler for DELETE /product/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let product = state
        .db
        .delete_product(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Product Not Found".into()))?;
    state.invalidate(catalog_changed(&product.id).review()).await;
    info!(product = %product.id, "product deleted");

    Ok(Json(json!({
        "success": true,
        "message": "Product Deleted Successfully",
    })))
}

/// Handler for POST /product/review/new/:id?id=<user>
///
/// Creates the user's review of the product or rewrites the existing one,
/// then recomputes the product's rating.
pub async fn new_review(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(actor): Query<UserIdQuery>,
    Json(req): Json<NewReviewRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = actor.require()?;
    state
        .db
        .user(&user)
        .await
        .ok_or_else(|| ApiError::NotFound("Not Logged In".into()))?;
    state
        .db
        .product(&product_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Product Not Found".into()))?;
    let rating = req.rating()?;

    let (review, created) = state
        .db
        .upsert_review(&user, &product_id, req.comment, rating)
        .await;
    state.db.refresh_rating(&product_id).await;
    state.invalidate(catalog_changed(&product_id).review()).await;

    let (status, message) = if created {
        (StatusCode::CREATED, "Review Added")
    } else {
        (StatusCode::OK, "Review Updated")
    };
    Ok((
        status,
        Json(json!({ "success": true, "message": message, "review": review })),
    ))
}

/// Handler for DELETE /product/review/:id?id=<user>
pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    Query(actor): Query<UserIdQuery>,
) -> ApiResult<Json<Value>> {
    let user = actor.require()?;
    state
        .db
        .user(&user)
        .await
        .ok_or_else(|| ApiError::NotFound("Not Logged In".into()))?;
    let review = state
        .db
        .review(&review_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Review Not Found".into()))?;
    if review.user != user {
        return Err(ApiError::Unauthorized("Not Authorized".into()));
    }

    state.db.delete_review(&review.id).await;
    // The product may already be gone; its rating then has nothing to update
    state.db.refresh_rating(&review.product).await;
    state.invalidate(catalog_changed(&review.product).review()).await;

    Ok(Json(json!({ "success": true, "message": "Review Deleted" })))
}
