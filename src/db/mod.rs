//! Database Module
//!
//! In-process document collections standing in for the document database.
//! Every document carries a UUID string id and a creation timestamp.

mod models;

pub use models::{
    Coupon, Gender, NewOrder, NewProduct, NewUser, Order, OrderItem, OrderStatus, Product,
    ProductFilter, ProductPatch, Review, Role, ShippingInfo, SortOrder, Timestamped, User,
};

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Collections {
    products: Vec<Product>,
    users: Vec<User>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
    coupons: Vec<Coupon>,
}

// == Database ==
#[derive(Debug, Default)]
pub struct Database {
    collections: RwLock<Collections>,
    /// Read queries served since startup
    queries: AtomicU64,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    async fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.collections.read().await
    }

    async fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections.write().await
    }

    // == Products ==
    pub async fn insert_product(&self, new: NewProduct) -> Product {
        self.insert_product_at(new, Utc::now()).await
    }

    pub async fn insert_product_at(&self, new: NewProduct, at: DateTime<Utc>) -> Product {
        let product = Product {
            id: new_id(),
            name: new.name,
            price: new.price,
            stock: new.stock,
            category: new.category.to_lowercase(),
            description: new.description,
            ratings: 0.0,
            num_of_reviews: 0,
            created_at: at,
            updated_at: at,
        };
        self.write().await.products.push(product.clone());
        product
    }

    pub async fn product(&self, id: &str) -> Option<Product> {
        self.read().await.products.iter().find(|p| p.id == id).cloned()
    }

    pub async fn update_product(&self, id: &str, patch: ProductPatch) -> Option<Product> {
        let mut db = self.write().await;
        let product = db.products.iter_mut().find(|p| p.id == id)?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(category) = patch.category {
            product.category = category.to_lowercase();
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        product.updated_at = Utc::now();
        Some(product.clone())
    }

    pub async fn delete_product(&self, id: &str) -> Option<Product> {
        let mut db = self.write().await;
        let index = db.products.iter().position(|p| p.id == id)?;
        Some(db.products.remove(index))
    }

    /// Newest products first.
    pub async fn latest_products(&self, limit: usize) -> Vec<Product> {
        let mut products = self.read().await.products.clone();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        products.truncate(limit);
        products
    }

    pub async fn all_products(&self) -> Vec<Product> {
        self.read().await.products.clone()
    }

    /// Distinct categories, sorted.
    pub async fn categories(&self) -> Vec<String> {
        self.read()
            .await
            .products
            .iter()
            .map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One page of filtered products plus the number of matches overall.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        skip: usize,
        limit: usize,
    ) -> (Vec<Product>, usize) {
        let db = self.read().await;
        let mut matched: Vec<&Product> = db.products.iter().filter(|p| filter.matches(p)).collect();
        match filter.sort {
            Some(SortOrder::Asc) => matched.sort_by(|a, b| a.price.total_cmp(&b.price)),
            Some(SortOrder::Desc) => matched.sort_by(|a, b| b.price.total_cmp(&a.price)),
            None => {}
        }
        let total = matched.len();
        let page = matched.into_iter().skip(skip).take(limit).cloned().collect();
        (page, total)
    }

    pub async fn find_products<F>(&self, predicate: F) -> Vec<Product>
    where
        F: Fn(&Product) -> bool,
    {
        let db = self.read().await;
        db.products.iter().filter(|p| predicate(*p)).cloned().collect()
    }

    pub async fn count_products<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Product) -> bool,
    {
        self.read().await.products.iter().filter(|p| predicate(*p)).count()
    }

    /// Lowers stock by `quantity`, never below zero. False if no such product.
    pub async fn reduce_stock(&self, id: &str, quantity: u32) -> bool {
        let mut db = self.write().await;
        match db.products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                product.stock = product.stock.saturating_sub(quantity);
                true
            }
            None => false,
        }
    }

    /// Recomputes a product's rating fields from its reviews.
    pub async fn refresh_rating(&self, product_id: &str) -> Option<Product> {
        let mut db = self.write().await;
        let (total, count) = db
            .reviews
            .iter()
            .filter(|r| r.product == product_id)
            .fold((0u32, 0u32), |(sum, n), r| (sum + u32::from(r.rating), n + 1));
        let product = db.products.iter_mut().find(|p| p.id == product_id)?;
        product.num_of_reviews = count;
        product.ratings = if count == 0 {
            0.0
        } else {
            (f64::from(total) / f64::from(count)).floor()
        };
        Some(product.clone())
    }

    // == Users ==
    pub async fn insert_user(&self, new: NewUser) -> User {
        self.insert_user_at(new, Utc::now()).await
    }

    pub async fn insert_user_at(&self, new: NewUser, at: DateTime<Utc>) -> User {
        let user = User {
            id: new_id(),
            name: new.name,
            email: new.email,
            gender: new.gender,
            role: new.role,
            dob: new.dob,
            created_at: at,
        };
        self.write().await.users.push(user.clone());
        user
    }

    pub async fn user(&self, id: &str) -> Option<User> {
        self.read().await.users.iter().find(|u| u.id == id).cloned()
    }

    pub async fn all_users(&self) -> Vec<User> {
        self.read().await.users.clone()
    }

    pub async fn delete_user(&self, id: &str) -> Option<User> {
        let mut db = self.write().await;
        let index = db.users.iter().position(|u| u.id == id)?;
        Some(db.users.remove(index))
    }

    pub async fn find_users<F>(&self, predicate: F) -> Vec<User>
    where
        F: Fn(&User) -> bool,
    {
        let db = self.read().await;
        db.users.iter().filter(|u| predicate(*u)).cloned().collect()
    }

    pub async fn count_users<F>(&self, predicate: F) -> usize
    where
        F: Fn(&User) -> bool,
    {
        self.read().await.users.iter().filter(|u| predicate(*u)).count()
    }

    // == Orders ==
    pub async fn insert_order(&self, new: NewOrder) -> Order {
        self.insert_order_at(new, Utc::now()).await
    }

    pub async fn insert_order_at(&self, new: NewOrder, at: DateTime<Utc>) -> Order {
        let order = Order {
            id: new_id(),
            shipping_info: new.shipping_info,
            user: new.user,
            subtotal: new.subtotal,
            tax: new.tax,
            shipping_charges: new.shipping_charges,
            discount: new.discount,
            total: new.total,
            status: OrderStatus::Processing,
            order_items: new.order_items,
            created_at: at,
        };
        self.write().await.orders.push(order.clone());
        order
    }

    pub async fn order(&self, id: &str) -> Option<Order> {
        self.read().await.orders.iter().find(|o| o.id == id).cloned()
    }

    pub async fn orders_of_user(&self, user: &str) -> Vec<Order> {
        self.find_orders(|o| o.user == user).await
    }

    pub async fn all_orders(&self) -> Vec<Order> {
        self.read().await.orders.clone()
    }

    /// Most recent orders first.
    pub async fn latest_orders(&self, limit: usize) -> Vec<Order> {
        let mut orders = self.read().await.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        orders
    }

    pub async fn set_order_status(&self, id: &str, status: OrderStatus) -> Option<Order> {
        let mut db = self.write().await;
        let order = db.orders.iter_mut().find(|o| o.id == id)?;
        order.status = status;
        Some(order.clone())
    }

    pub async fn delete_order(&self, id: &str) -> Option<Order> {
        let mut db = self.write().await;
        let index = db.orders.iter().position(|o| o.id == id)?;
        Some(db.orders.remove(index))
    }

    pub async fn find_orders<F>(&self, predicate: F) -> Vec<Order>
    where
        F: Fn(&Order) -> bool,
    {
        let db = self.read().await;
        db.orders.iter().filter(|o| predicate(*o)).cloned().collect()
    }

    pub async fn count_orders<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Order) -> bool,
    {
        self.read().await.orders.iter().filter(|o| predicate(*o)).count()
    }

    // == Reviews ==
    /// Reviews of a product, most recently updated first.
    pub async fn reviews_of_product(&self, product_id: &str) -> Vec<Review> {
        let mut reviews: Vec<Review> = {
            let db = self.read().await;
            db.reviews
                .iter()
                .filter(|r| r.product == product_id)
                .cloned()
                .collect()
        };
        reviews.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        reviews
    }

    pub async fn review(&self, id: &str) -> Option<Review> {
        self.read().await.reviews.iter().find(|r| r.id == id).cloned()
    }

    /// Creates the user's review of a product, or rewrites the existing one.
    /// Returns the review and whether it was newly created.
    pub async fn upsert_review(
        &self,
        user: &str,
        product: &str,
        comment: String,
        rating: u8,
    ) -> (Review, bool) {
        let mut db = self.write().await;
        let now = Utc::now();

        if let Some(existing) = db
            .reviews
            .iter_mut()
            .find(|r| r.user == user && r.product == product)
        {
            existing.comment = comment;
            existing.rating = rating;
            existing.updated_at = now;
            return (existing.clone(), false);
        }

        let review = Review {
            id: new_id(),
            comment,
            rating,
            user: user.to_string(),
            product: product.to_string(),
            created_at: now,
            updated_at: now,
        };
        db.reviews.push(review.clone());
        (review, true)
    }

    pub async fn delete_review(&self, id: &str) -> Option<Review> {
        let mut db = self.write().await;
        let index = db.reviews.iter().position(|r| r.id == id)?;
        Some(db.reviews.remove(index))
    }

    // == Coupons ==
    /// Creates a coupon. None if the code is already taken.
    pub async fn insert_coupon(&self, code: String, amount: f64) -> Option<Coupon> {
        let mut db = self.write().await;
        if db.coupons.iter().any(|c| c.code == code) {
            return None;
        }
        let coupon = Coupon {
            id: new_id(),
            code,
            amount,
            created_at: Utc::now(),
        };
        db.coupons.push(coupon.clone());
        Some(coupon)
    }

    pub async fn coupon(&self, id: &str) -> Option<Coupon> {
        self.read().await.coupons.iter().find(|c| c.id == id).cloned()
    }

    pub async fn coupon_by_code(&self, code: &str) -> Option<Coupon> {
        self.read().await.coupons.iter().find(|c| c.code == code).cloned()
    }

    pub async fn all_coupons(&self) -> Vec<Coupon> {
        self.read().await.coupons.clone()
    }

    pub async fn update_coupon(
        &self,
        id: &str,
        code: Option<String>,
        amount: Option<f64>,
    ) -> Option<Coupon> {
        let mut db = self.write().await;
        let coupon = db.coupons.iter_mut().find(|c| c.id == id)?;
        if let Some(code) = code {
            coupon.code = code;
        }
        if let Some(amount) = amount {
            coupon.amount = amount;
        }
        Some(coupon.clone())
    }

    pub async fn delete_coupon(&self, id: &str) -> Option<Coupon> {
        let mut db = self.write().await;
        let index = db.coupons.iter().position(|c| c.id == id)?;
        Some(db.coupons.remove(index))
    }
}
