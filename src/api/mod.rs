//! API Module
//!
//! HTTP handlers and routing for the storefront REST API. Reads go through
//! the cache client; writes commit to the database and then invalidate.
//!
//! # Endpoints
//! - `/api/v1/product` - Catalog, filtered listing, reviews
//! - `/api/v1/order` - Orders and fulfilment
//! - `/api/v1/payment/coupon` - Coupons
//! - `/api/v1/user` - Users
//! - `/api/v1/dashboard` - Admin statistics and charts
//! - `GET /health`, `GET /cache/stats` - Operational endpoints

pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod routes;
pub mod state;
pub mod system;
pub mod users;

pub use routes::{create_router, API_PREFIX};
pub use state::AppState;
