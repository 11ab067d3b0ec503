//! Integration Tests for API Endpoints
//!
//! Drives the full router and checks both the responses and what the cache
//! holds afterwards.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_cache::{
    cache::{CacheBackend, CacheClient, CacheKey, ListingQuery},
    create_router,
    error::{CacheError, Result as CacheResult},
    AppState, Database,
};

// == Helper Functions ==

fn create_test_app() -> (Router, AppState) {
    let state = AppState::in_memory();
    (create_router(state.clone()), state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn create_product(app: &Router, name: &str, price: f64, stock: u32, category: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/product/new",
        Some(json!({
            "name": name,
            "price": price,
            "stock": stock,
            "category": category,
            "description": format!("A {}", name),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["product"]["_id"].as_str().unwrap().to_string()
}

async fn create_user(app: &Router, name: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/user/new",
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name),
            "gender": "female",
            "dob": "1995-04-12",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["user"]["_id"].as_str().unwrap().to_string()
}

// == Product Cache Tests ==

#[tokio::test]
async fn test_new_product_invalidates_catalog_keys() {
    let (app, state) = create_test_app();

    let (status, json) = send(&app, "GET", "/api/v1/product/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["products"].as_array().unwrap().len(), 0);
    send(&app, "GET", "/api/v1/product/categories", None).await;
    assert!(state.cache.contains(&CacheKey::LatestProducts).await);
    assert!(state.cache.contains(&CacheKey::Categories).await);

    create_product(&app, "Mirrorless Camera", 899.0, 4, "Camera").await;

    assert!(!state.cache.contains(&CacheKey::LatestProducts).await);
    assert!(!state.cache.contains(&CacheKey::Categories).await);

    let (_, json) = send(&app, "GET", "/api/v1/product/latest", None).await;
    assert_eq!(json["products"].as_array().unwrap().len(), 1);
    let (_, json) = send(&app, "GET", "/api/v1/product/categories", None).await;
    assert_eq!(json["categories"], json!(["camera"]));
}

#[tokio::test]
async fn test_cached_reads_skip_the_database() {
    let (app, state) = create_test_app();
    create_product(&app, "Desk Lamp", 25.0, 10, "home").await;

    send(&app, "GET", "/api/v1/product/admin-products", None).await;
    let queries = state.db.query_count();

    for _ in 0..3 {
        let (status, json) = send(&app, "GET", "/api/v1/product/admin-products", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["products"][0]["name"], "Desk Lamp");
    }

    assert_eq!(state.db.query_count(), queries);
    assert_eq!(state.cache.stats().hits, 3);
}

#[tokio::test]
async fn test_listing_pages_are_invalidated_on_update() {
    let (app, state) = create_test_app();
    let id = create_product(&app, "Travel Mug", 12.0, 10, "kitchen").await;
    create_product(&app, "Tea Mug", 8.0, 10, "kitchen").await;
    create_product(&app, "Chef Knife", 40.0, 10, "kitchen").await;

    let uri = "/api/v1/product/all?search=mug&sort=asc&category=kitchen";
    let (status, json) = send(&app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["products"][0]["name"], "Tea Mug");
    assert_eq!(json["totalPage"], 1);

    let query = ListingQuery {
        search: Some("mug".into()),
        category: Some("kitchen".into()),
        sort: Some(storefront_cache::db::SortOrder::Asc),
        ..ListingQuery::default()
    };
    let key = CacheKey::Listing(query);
    assert!(state.cache.contains(&key).await);
    assert!(state.cache.listings().contains(&key.to_string()));

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/product/{}", id),
        Some(json!({ "price": 5.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert!(!state.cache.contains(&key).await);
    assert!(state.cache.listings().is_empty());

    let (_, json) = send(&app, "GET", uri, None).await;
    assert_eq!(json["products"][0]["name"], "Travel Mug");
    assert_eq!(json["products"][0]["price"], 5.0);
}

#[tokio::test]
async fn test_listing_pagination() {
    let (app, _) = create_test_app();
    for i in 0..10 {
        create_product(&app, &format!("Book {}", i), 10.0 + i as f64, 1, "books").await;
    }

    let (_, first) = send(&app, "GET", "/api/v1/product/all?sort=desc", None).await;
    assert_eq!(first["totalPage"], 2);
    assert_eq!(first["products"].as_array().unwrap().len(), 8);
    assert_eq!(first["products"][0]["price"], 19.0);

    let (_, second) = send(&app, "GET", "/api/v1/product/all?sort=desc&page=2", None).await;
    assert_eq!(second["products"].as_array().unwrap().len(), 2);

    let (_, cheap) = send(&app, "GET", "/api/v1/product/all?price=11", None).await;
    assert_eq!(cheap["products"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_listing_accepts_empty_and_malformed_params() {
    let (app, state) = create_test_app();
    create_product(&app, "Notebook", 4.0, 5, "stationery").await;
    create_product(&app, "Fountain Pen", 30.0, 2, "stationery").await;

    for uri in [
        "/api/v1/product/all?search=&sort=&category=&price=&page=1",
        "/api/v1/product/all?sort=",
        "/api/v1/product/all?price=",
        "/api/v1/product/all?price=0",
        "/api/v1/product/all?page=abc",
        "/api/v1/product/all?page=",
        "/api/v1/product/all?page=0",
    ] {
        let (status, json) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(json["success"], true, "{}", uri);
        assert_eq!(json["products"].as_array().unwrap().len(), 2, "{}", uri);
        assert_eq!(json["totalPage"], 1, "{}", uri);
    }

    // Every spelling of "no filters, first page" shares one cache entry
    assert_eq!(state.cache.listings().len(), 1);
    assert!(
        state
            .cache
            .contains(&CacheKey::Listing(ListingQuery::default()))
            .await
    );
}

#[tokio::test]
async fn test_missing_product_is_not_cached() {
    let (app, state) = create_test_app();

    let (status, json) = send(&app, "GET", "/api/v1/product/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Product Not Found");

    assert!(
        !state
            .cache
            .contains(&CacheKey::Product("does-not-exist".into()))
            .await
    );
}

#[tokio::test]
async fn test_new_product_missing_fields() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/product/new",
        Some(json!({ "name": "Nameless" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Please enter All fields");
}

// == Review Tests ==

#[tokio::test]
async fn test_review_lifecycle() {
    let (app, state) = create_test_app();
    let product = create_product(&app, "Headphones", 120.0, 3, "audio").await;
    let author = create_user(&app, "ana").await;
    let other = create_user(&app, "ben").await;

    send(&app, "GET", &format!("/api/v1/product/reviews/{}", product), None).await;
    assert!(state.cache.contains(&CacheKey::Reviews(product.clone())).await);

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/product/review/new/{}?id={}", product, author),
        Some(json!({ "comment": "Great bass", "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let review = json["review"]["_id"].as_str().unwrap().to_string();
    assert!(!state.cache.contains(&CacheKey::Reviews(product.clone())).await);

    let (_, json) = send(&app, "GET", &format!("/api/v1/product/{}", product), None).await;
    assert_eq!(json["product"]["ratings"], 4.0);
    assert_eq!(json["product"]["numOfReviews"], 1);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/product/review/new/{}?id={}", product, author),
        Some(json!({ "comment": "Still great", "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/product/review/{}?id={}", review, other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Not Authorized");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/product/review/{}?id={}", review, author),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", &format!("/api/v1/product/{}", product), None).await;
    assert_eq!(json["product"]["numOfReviews"], 0);
    let (_, json) = send(&app, "GET", &format!("/api/v1/product/reviews/{}", product), None).await;
    assert_eq!(json["reviews"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_review_delete_succeeds_after_product_removed() {
    let (app, state) = create_test_app();
    let product = create_product(&app, "Turntable", 240.0, 1, "audio").await;
    let author = create_user(&app, "dina").await;

    let (_, json) = send(
        &app,
        "POST",
        &format!("/api/v1/product/review/new/{}?id={}", product, author),
        Some(json!({ "comment": "Warm sound", "rating": 5 })),
    )
    .await;
    let review = json["review"]["_id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/product/{}", product), None).await;
    assert_eq!(status, StatusCode::OK);
    send(&app, "GET", &format!("/api/v1/product/reviews/{}", product), None).await;
    assert!(state.cache.contains(&CacheKey::Reviews(product.clone())).await);

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/product/review/{}?id={}", review, author),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Review Deleted");
    assert!(!state.cache.contains(&CacheKey::Reviews(product.clone())).await);
}

// == Order Tests ==

#[tokio::test]
async fn test_order_lifecycle() {
    let (app, state) = create_test_app();
    let product = create_product(&app, "Keyboard", 60.0, 5, "computers").await;
    let user = create_user(&app, "chen").await;

    send(&app, "GET", &format!("/api/v1/order/my?id={}", user), None).await;
    send(&app, "GET", "/api/v1/order/all", None).await;
    send(&app, "GET", &format!("/api/v1/product/{}", product), None).await;
    assert!(state.cache.contains(&CacheKey::MyOrders(user.clone())).await);

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/order/new",
        Some(json!({
            "shippingInfo": {
                "address": "12 Hill Rd",
                "city": "Pune",
                "state": "MH",
                "country": "IN",
                "pinCode": "411001"
            },
            "user": user,
            "subtotal": 120.0,
            "tax": 21.6,
            "shippingCharges": 0.0,
            "discount": 0.0,
            "total": 141.6,
            "orderItems": [{ "name": "Keyboard", "price": 60.0, "quantity": 2, "productId": product }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order = json["order"]["_id"].as_str().unwrap().to_string();

    assert!(!state.cache.contains(&CacheKey::MyOrders(user.clone())).await);
    assert!(!state.cache.contains(&CacheKey::AllOrders).await);
    assert!(!state.cache.contains(&CacheKey::Product(product.clone())).await);

    let (_, json) = send(&app, "GET", &format!("/api/v1/product/{}", product), None).await;
    assert_eq!(json["product"]["stock"], 3);
    let (_, json) = send(&app, "GET", &format!("/api/v1/order/my?id={}", user), None).await;
    assert_eq!(json["orders"].as_array().unwrap().len(), 1);

    send(&app, "GET", &format!("/api/v1/order/{}", order), None).await;
    let (status, json) = send(&app, "PUT", &format!("/api/v1/order/{}", order), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order"]["status"], "Shipped");
    assert!(!state.cache.contains(&CacheKey::Order(order.clone())).await);

    let (_, json) = send(&app, "GET", &format!("/api/v1/order/{}", order), None).await;
    assert_eq!(json["order"]["status"], "Shipped");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/order/{}", order), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/v1/order/{}", order), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_new_order_missing_fields() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "POST", "/api/v1/order/new", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

// == Coupon Tests ==

#[tokio::test]
async fn test_coupon_lifecycle() {
    let (app, state) = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/payment/coupon/new",
        Some(json!({ "coupon": "SAVE10", "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/payment/coupon/new",
        Some(json!({ "coupon": "SAVE10", "amount": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(&app, "GET", "/api/v1/payment/coupon/discount?coupon=SAVE10", None).await;
    assert_eq!(json["discount"], 10.0);
    let (status, json) = send(&app, "GET", "/api/v1/payment/coupon/discount?coupon=NOPE", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid Coupon Code");

    let (_, json) = send(&app, "GET", "/api/v1/payment/coupon/all", None).await;
    let id = json["coupons"][0]["_id"].as_str().unwrap().to_string();
    assert!(state.cache.contains(&CacheKey::AllCoupons).await);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/payment/coupon/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!state.cache.contains(&CacheKey::AllCoupons).await);

    let (_, json) = send(&app, "GET", "/api/v1/payment/coupon/all", None).await;
    assert_eq!(json["coupons"].as_array().unwrap().len(), 0);
}

// == Dashboard Tests ==

#[tokio::test]
async fn test_dashboard_is_cached_until_a_write() {
    let (app, state) = create_test_app();
    create_product(&app, "Monitor", 200.0, 0, "computers").await;
    create_user(&app, "dana").await;

    let (status, json) = send(&app, "GET", "/api/v1/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stats"]["count"]["product"], 1);
    assert_eq!(json["stats"]["categoryCount"]["computers"], 100);
    assert_eq!(json["stats"]["chart"]["order"].as_array().unwrap().len(), 6);

    let (_, pie) = send(&app, "GET", "/api/v1/dashboard/pie", None).await;
    assert_eq!(pie["charts"]["stockAvailability"]["outOfStock"], 1);
    let (_, bar) = send(&app, "GET", "/api/v1/dashboard/bar", None).await;
    assert_eq!(bar["charts"]["orders"].as_array().unwrap().len(), 12);
    let (_, line) = send(&app, "GET", "/api/v1/dashboard/line", None).await;
    assert_eq!(line["charts"]["revenue"].as_array().unwrap().len(), 12);

    for key in CacheKey::ADMIN {
        assert!(state.cache.contains(&key).await, "{} should be cached", key);
    }

    create_user(&app, "eli").await;

    for key in CacheKey::ADMIN {
        assert!(!state.cache.contains(&key).await, "{} should be invalidated", key);
    }
    let (_, json) = send(&app, "GET", "/api/v1/dashboard/stats", None).await;
    assert_eq!(json["stats"]["userRatio"]["female"], 2);
}

// == Backend Failure Tests ==

/// Backend whose every call fails, as an unreachable Redis would.
struct UnreachableBackend;

#[async_trait]
impl CacheBackend for UnreachableBackend {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Configuration("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError::Configuration("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Configuration("connection refused".into()))
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Configuration("connection refused".into()))
    }
}

#[tokio::test]
async fn test_requests_survive_cache_outage() {
    let cache = CacheClient::new(
        Arc::new(UnreachableBackend),
        Some(Duration::from_secs(60)),
        Duration::from_secs(30),
    );
    let state = AppState::new(Arc::new(Database::new()), cache, 8);
    let app = create_router(state.clone());

    create_product(&app, "Router", 80.0, 2, "network").await;

    let (status, json) = send(&app, "GET", "/api/v1/product/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["products"][0]["name"], "Router");

    let (status, _) = send(&app, "GET", "/api/v1/product/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.cache.stats().fallthroughs >= 2);
}

// == Operational Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let (app, _) = create_test_app();
    send(&app, "GET", "/api/v1/product/categories", None).await;
    send(&app, "GET", "/api/v1/product/categories", None).await;

    let (status, json) = send(&app, "GET", "/cache/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["backend"], "memory");
    assert_eq!(json["evictions"], 0);
    assert_eq!(json["stats"]["hits"], 1);
    assert_eq!(json["stats"]["misses"], 1);
    assert_eq!(json["stats"]["hitRate"], 0.5);
}

#[tokio::test]
async fn test_invalid_json_request() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payment/coupon/new")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
