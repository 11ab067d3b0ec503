//! API Routes
//!
//! Configures the Axum router with all storefront endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{coupons, dashboard, orders, products, system, users, AppState};

/// Mount point of the storefront API.
pub const API_PREFIX: &str = "/api/v1";

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(products::new_product))
        .route("/all", get(products::search_products))
        .route("/latest", get(products::latest_products))
        .route("/categories", get(products::categories))
        .route("/admin-products", get(products::admin_products))
        .route(
            "/:id",
            get(products::single_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/reviews/:id", get(products::reviews_of_product))
        .route("/review/new/:id", post(products::new_review))
        .route("/review/:id", delete(products::delete_review))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(orders::new_order))
        .route("/my", get(orders::my_orders))
        .route("/all", get(orders::all_orders))
        .route(
            "/:id",
            get(orders::single_order)
                .put(orders::process_order)
                .delete(orders::delete_order),
        )
}

fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(coupons::new_coupon))
        .route("/discount", get(coupons::apply_discount))
        .route("/all", get(coupons::all_coupons))
        .route(
            "/:id",
            get(coupons::get_coupon)
                .put(coupons::update_coupon)
                .delete(coupons::delete_coupon),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(users::new_user))
        .route("/all", get(users::all_users))
        .route("/:id", get(users::get_user).delete(users::delete_user))
}

fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/pie", get(dashboard::pie_charts))
        .route("/bar", get(dashboard::bar_charts))
        .route("/line", get(dashboard::line_charts))
}

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `/api/v1/product/...` - Catalog, listing and reviews
/// - `/api/v1/order/...` - Orders
/// - `/api/v1/payment/coupon/...` - Coupons and discounts
/// - `/api/v1/user/...` - Users
/// - `/api/v1/dashboard/...` - Admin statistics and charts
/// - `GET /health` - Health check endpoint
/// - `GET /cache/stats` - Cache counters
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .nest("/product", product_routes())
        .nest("/order", order_routes())
        .nest("/payment/coupon", coupon_routes())
        .nest("/user", user_routes())
        .nest("/dashboard", dashboard_routes());

    Router::new()
        .nest(API_PREFIX, api)
        .route("/health", get(system::health_handler))
        .route("/cache/stats", get(system::cache_stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
