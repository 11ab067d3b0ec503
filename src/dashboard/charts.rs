//! Dashboard payloads. Each builder is a pure function of the database
//! contents and the reference instant; caching is the caller's concern.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dashboard::aggregate::{
    calc_percentage, category_shares, month_buckets, month_counts, trailing_months, MonthWindows,
};
use crate::db::{Database, Gender, Order, OrderStatus, Product, Role};

/// Share of gross income attributed to marketing.
const MARKETING_SHARE: f64 = 0.30;
const LATEST_TRANSACTIONS: usize = 4;

// == Stats ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub category_count: BTreeMap<String, i64>,
    pub change_percent: ChangePercent,
    pub count: Totals,
    pub chart: RevenueChart,
    pub user_ratio: UserRatio,
    pub latest_transaction: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePercent {
    pub revenue: i64,
    pub product: i64,
    pub user: i64,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub revenue: f64,
    pub user: usize,
    pub product: usize,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueChart {
    pub order: Vec<u64>,
    pub revenue: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRatio {
    pub male: usize,
    pub female: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub discount: f64,
    pub amount: f64,
    pub quantity: usize,
    pub status: OrderStatus,
}

fn revenue(orders: &[Order]) -> f64 {
    orders.iter().map(|o| o.total).sum()
}

/// Category shares of one product snapshot, so every share and the total
/// agree with each other.
fn category_count(products: &[Product]) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for product in products {
        *counts.entry(product.category.as_str()).or_default() += 1;
    }
    let counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(category, n)| (category.to_string(), n))
        .collect();
    category_shares(&counts, products.len())
}

/// Headline counts, month-over-month change and the six-month order chart.
pub async fn build_stats(db: &Database, now: DateTime<Utc>) -> DashboardStats {
    let windows = MonthWindows::around(now);
    let (this, last) = (windows.this_month, windows.last_month);
    let six_months = trailing_months(now, 6);

    let this_products = db.count_products(|p| this.contains(p.created_at)).await;
    let last_products = db.count_products(|p| last.contains(p.created_at)).await;
    let this_users = db.count_users(|u| this.contains(u.created_at)).await;
    let last_users = db.count_users(|u| last.contains(u.created_at)).await;
    let this_orders = db.find_orders(|o| this.contains(o.created_at)).await;
    let last_orders = db.find_orders(|o| last.contains(o.created_at)).await;
    let recent_orders = db.find_orders(|o| six_months.contains(o.created_at)).await;
    let all_orders = db.all_orders().await;
    let users = db.all_users().await;
    let products = db.all_products().await;
    let female_count = users.iter().filter(|u| u.gender == Gender::Female).count();

    let change_percent = ChangePercent {
        revenue: calc_percentage(revenue(&this_orders), revenue(&last_orders)),
        product: calc_percentage(this_products as f64, last_products as f64),
        user: calc_percentage(this_users as f64, last_users as f64),
        order: calc_percentage(this_orders.len() as f64, last_orders.len() as f64),
    };

    let latest_transaction = db
        .latest_orders(LATEST_TRANSACTIONS)
        .await
        .into_iter()
        .map(|o| Transaction {
            quantity: o.order_items.len(),
            discount: o.discount,
            amount: o.total,
            status: o.status,
            id: o.id,
        })
        .collect();

    DashboardStats {
        category_count: category_count(&products),
        change_percent,
        count: Totals {
            revenue: revenue(&all_orders),
            user: users.len(),
            product: products.len(),
            order: all_orders.len(),
        },
        chart: RevenueChart {
            order: month_counts(6, now, &recent_orders),
            revenue: month_buckets(6, now, &recent_orders, |o| o.total),
        },
        user_ratio: UserRatio {
            male: users.len() - female_count,
            female: female_count,
        },
        latest_transaction,
    }
}

// == Pie Charts ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieCharts {
    pub order_fullfillment: OrderFulfillment,
    pub product_categories: BTreeMap<String, i64>,
    pub stock_availability: StockAvailability,
    pub revenue_distribution: RevenueDistribution,
    pub admin_customer: AdminCustomer,
    pub users_age_group: AgeGroups,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFulfillment {
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAvailability {
    pub in_stock: usize,
    pub out_of_stock: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueDistribution {
    pub net_margin: f64,
    pub discount: f64,
    pub production_cost: f64,
    pub burnt: f64,
    pub marketing_cost: f64,
}

impl RevenueDistribution {
    /// Splits gross income: shipping is production cost, tax is burnt,
    /// and a fixed share goes to marketing.
    pub fn from_orders(orders: &[Order]) -> Self {
        let gross: f64 = orders.iter().map(|o| o.total).sum();
        let discount: f64 = orders.iter().map(|o| o.discount).sum();
        let production_cost: f64 = orders.iter().map(|o| o.shipping_charges).sum();
        let burnt: f64 = orders.iter().map(|o| o.tax).sum();
        let marketing_cost = (gross * MARKETING_SHARE).round();

        Self {
            net_margin: gross - discount - production_cost - burnt - marketing_cost,
            discount,
            production_cost,
            burnt,
            marketing_cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCustomer {
    pub admin: usize,
    pub customer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroups {
    pub teen: usize,
    pub adult: usize,
    pub old: usize,
}

pub async fn build_pie_charts(db: &Database, now: DateTime<Utc>) -> PieCharts {
    let processing = db.count_orders(|o| o.status == OrderStatus::Processing).await;
    let shipped = db.count_orders(|o| o.status == OrderStatus::Shipped).await;
    let delivered = db.count_orders(|o| o.status == OrderStatus::Delivered).await;
    let products = db.all_products().await;
    let out_of_stock = products.iter().filter(|p| p.stock == 0).count();
    let orders = db.all_orders().await;
    let users = db.all_users().await;

    let today = now.date_naive();
    let mut ages = AgeGroups {
        teen: 0,
        adult: 0,
        old: 0,
    };
    for age in users.iter().map(|u| u.age_on(today)) {
        match age {
            0..=19 => ages.teen += 1,
            20..=39 => ages.adult += 1,
            _ => ages.old += 1,
        }
    }

    PieCharts {
        order_fullfillment: OrderFulfillment {
            processing,
            shipped,
            delivered,
        },
        product_categories: category_count(&products),
        stock_availability: StockAvailability {
            in_stock: products.len() - out_of_stock,
            out_of_stock,
        },
        revenue_distribution: RevenueDistribution::from_orders(&orders),
        admin_customer: AdminCustomer {
            admin: users.iter().filter(|u| u.role == Role::Admin).count(),
            customer: users.iter().filter(|u| u.role == Role::User).count(),
        },
        users_age_group: ages,
    }
}

// == Bar Charts ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarCharts {
    pub users: Vec<u64>,
    pub products: Vec<u64>,
    pub orders: Vec<u64>,
}

/// Six months of new users and products, twelve months of orders.
pub async fn build_bar_charts(db: &Database, now: DateTime<Utc>) -> BarCharts {
    let six = trailing_months(now, 6);
    let twelve = trailing_months(now, 12);

    let products = db.find_products(|p| six.contains(p.created_at)).await;
    let users = db.find_users(|u| six.contains(u.created_at)).await;
    let orders = db.find_orders(|o| twelve.contains(o.created_at)).await;

    BarCharts {
        users: month_counts(6, now, &users),
        products: month_counts(6, now, &products),
        orders: month_counts(12, now, &orders),
    }
}

// == Line Charts ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineCharts {
    pub users: Vec<u64>,
    pub products: Vec<u64>,
    pub discount: Vec<f64>,
    pub revenue: Vec<f64>,
}

/// Twelve months of new users and products, discounts and revenue.
pub async fn build_line_charts(db: &Database, now: DateTime<Utc>) -> LineCharts {
    let twelve = trailing_months(now, 12);

    let products = db.find_products(|p| twelve.contains(p.created_at)).await;
    let users = db.find_users(|u| twelve.contains(u.created_at)).await;
    let orders = db.find_orders(|o| twelve.contains(o.created_at)).await;

    LineCharts {
        users: month_counts(12, now, &users),
        products: month_counts(12, now, &products),
        discount: month_buckets(12, now, &orders, |o| o.discount),
        revenue: month_buckets(12, now, &orders, |o| o.total),
    }
}
