//! Document types held by the database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Documents carrying a creation timestamp.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! timestamped {
    ($($ty:ty),*) => {
        $(impl Timestamped for $ty {
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })*
    };
}

timestamped!(Product, User, Order, Review, Coupon);

// == Product ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub stock: u32,
    pub category: String,
    pub description: String,
    pub ratings: f64,
    pub num_of_reviews: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a product being created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub stock: u32,
    pub category: String,
    pub description: String,
}

/// Partial product update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Price ordering of the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Product listing filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub category: Option<String>,
    /// Inclusive price ceiling
    pub max_price: Option<f64>,
    pub sort: Option<SortOrder>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = &self.search {
            if !product
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

// == User ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub role: Role,
    pub dob: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Age in whole years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.dob).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub role: Role,
    pub dob: NaiveDate,
}

// == Order ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Next fulfilment stage; `Delivered` is terminal.
    pub fn advance(self) -> Self {
        match self {
            OrderStatus::Processing => OrderStatus::Shipped,
            OrderStatus::Shipped | OrderStatus::Delivered => OrderStatus::Delivered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pin_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub shipping_info: ShippingInfo,
    pub user: String,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_charges: f64,
    pub discount: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub order_items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub shipping_info: ShippingInfo,
    pub user: String,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_charges: f64,
    pub discount: f64,
    pub total: f64,
    pub order_items: Vec<OrderItem>,
}

// == Review ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub comment: String,
    pub rating: u8,
    pub user: String,
    pub product: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// == Coupon ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: f64, category: &str) -> Product {
        let now = Utc::now();
        Product {
            id: "p".into(),
            name: name.into(),
            price,
            stock: 1,
            category: category.into(),
            description: String::new(),
            ratings: 0.0,
            num_of_reviews: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_filter_matches() {
        let mug = product("Coffee Mug", 12.0, "kitchen");
        let filter = ProductFilter {
            search: Some("mug".into()),
            category: Some("kitchen".into()),
            max_price: Some(12.0),
            sort: None,
        };
        assert!(filter.matches(&mug));
        assert!(!ProductFilter {
            max_price: Some(11.99),
            ..filter.clone()
        }
        .matches(&mug));
        assert!(!ProductFilter {
            category: Some("garden".into()),
            ..filter
        }
        .matches(&mug));
    }

    #[test]
    fn test_order_status_advance() {
        assert_eq!(OrderStatus::Processing.advance(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::Shipped.advance(), OrderStatus::Delivered);
        assert_eq!(OrderStatus::Delivered.advance(), OrderStatus::Delivered);
    }

    #[test]
    fn test_user_age() {
        let user = User {
            id: "u".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            gender: Gender::Female,
            role: Role::User,
            dob: NaiveDate::from_ymd_opt(2000, 6, 16).unwrap(),
            created_at: Utc::now(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(user.age_on(today), 23);
    }

    #[test]
    fn test_product_serializes_mongo_style() {
        let json = serde_json::to_value(product("Lamp", 30.0, "home")).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("numOfReviews").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
