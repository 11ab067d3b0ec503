//! Cache Key Module
//!
//! The fixed set of keys the storefront caches under, and the structured
//! product-listing key.

use std::fmt::{self, Write};

use serde::Deserialize;

use crate::db::SortOrder;

/// Prefix shared by every product listing key.
pub const LISTING_PREFIX: &str = "products-";

// == Cache Key ==
/// Every cacheable query shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    LatestProducts,
    Categories,
    AllProducts,
    Product(String),
    Reviews(String),
    Listing(ListingQuery),
    AdminStats,
    AdminPieCharts,
    AdminBarCharts,
    AdminLineCharts,
    MyOrders(String),
    AllOrders,
    Order(String),
    AllCoupons,
}

impl CacheKey {
    /// Dashboard keys, all derived from the stats aggregator.
    pub const ADMIN: [CacheKey; 4] = [
        CacheKey::AdminStats,
        CacheKey::AdminPieCharts,
        CacheKey::AdminBarCharts,
        CacheKey::AdminLineCharts,
    ];

    /// Product-derived keys that exist exactly once.
    pub const PRODUCT_FIXED: [CacheKey; 3] = [
        CacheKey::LatestProducts,
        CacheKey::Categories,
        CacheKey::AllProducts,
    ];

    /// Paginated listing keys live in an unbounded key space.
    pub fn is_listing(&self) -> bool {
        matches!(self, CacheKey::Listing(_))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::LatestProducts => f.write_str("latest-products"),
            CacheKey::Categories => f.write_str("categories"),
            CacheKey::AllProducts => f.write_str("all-products"),
            CacheKey::Product(id) => write!(f, "product-{}", id),
            CacheKey::Reviews(id) => write!(f, "reviews-{}", id),
            CacheKey::Listing(query) => f.write_str(&query.cache_key()),
            CacheKey::AdminStats => f.write_str("admin-stats"),
            CacheKey::AdminPieCharts => f.write_str("admin-pie-charts"),
            CacheKey::AdminBarCharts => f.write_str("admin-bar-charts"),
            CacheKey::AdminLineCharts => f.write_str("admin-line-charts"),
            CacheKey::MyOrders(user) => write!(f, "my-orders-{}", user),
            CacheKey::AllOrders => f.write_str("all-orders"),
            CacheKey::Order(id) => write!(f, "order-{}", id),
            CacheKey::AllCoupons => f.write_str("all-coupons"),
        }
    }
}

// == Listing Query ==
/// Query parameters of the paginated product listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "ListingParams")]
pub struct ListingQuery {
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
    pub category: Option<String>,
    /// Price ceiling, inclusive
    pub price: Option<u64>,
    pub page: u32,
}

/// Listing parameters as they arrive in the URL. Any of them may be empty
/// or malformed without failing the request.
#[derive(Debug, Default, Deserialize)]
struct ListingParams {
    search: Option<String>,
    sort: Option<String>,
    category: Option<String>,
    price: Option<String>,
    page: Option<String>,
}

impl From<ListingParams> for ListingQuery {
    fn from(params: ListingParams) -> Self {
        let text = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Self {
            search: text(params.search),
            // Any sort other than ascending orders by descending price
            sort: text(params.sort).map(|s| match s.trim() {
                "asc" => SortOrder::Asc,
                _ => SortOrder::Desc,
            }),
            category: text(params.category),
            // A zero or unreadable ceiling means no ceiling
            price: text(params.price)
                .and_then(|p| p.trim().parse::<u64>().ok())
                .filter(|p| *p > 0),
            page: text(params.page)
                .and_then(|p| p.trim().parse::<u32>().ok())
                .unwrap_or_else(first_page),
        }
    }
}

fn first_page() -> u32 {
    1
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: None,
            category: None,
            price: None,
            page: first_page(),
        }
    }
}

impl ListingQuery {
    /// Canonical form: blank text filters are absent and pages start at 1.
    pub fn normalized(mut self) -> Self {
        self.search = self.search.filter(|s| !s.trim().is_empty());
        self.category = self.category.filter(|c| !c.trim().is_empty());
        self.page = self.page.max(1);
        self
    }

    /// Deterministic key for this query.
    ///
    /// Each optional field is written as `_` when absent or `<len>:<text>`
    /// when present, so no two distinct queries share a key even when a
    /// value contains the `-` separator.
    pub fn cache_key(&self) -> String {
        let sort = self.sort.map(SortOrder::as_str);
        let price = self.price.map(|p| p.to_string());

        let mut key = String::from(LISTING_PREFIX);
        push_field(&mut key, self.search.as_deref());
        key.push('-');
        push_field(&mut key, sort);
        key.push('-');
        push_field(&mut key, self.category.as_deref());
        key.push('-');
        push_field(&mut key, price.as_deref());
        key.push('-');
        let _ = write!(key, "{}", self.page);
        key
    }
}

fn push_field(key: &mut String, value: Option<&str>) {
    match value {
        Some(text) => {
            let _ = write!(key, "{}:{}", text.len(), text);
        }
        None => key.push('_'),
    }
}
