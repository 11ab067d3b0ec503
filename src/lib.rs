//! Storefront Cache - e-commerce API backend with a read-through cache
//!
//! Catalog, orders, coupons, reviews, users and an admin dashboard served
//! over HTTP, with query results cached in memory or Redis and invalidated
//! explicitly after every write.

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::CacheClient;
pub use config::Config;
pub use db::Database;
pub use tasks::spawn_cleanup_task;
