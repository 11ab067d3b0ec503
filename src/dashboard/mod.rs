//! Dashboard Module
//!
//! Admin statistics and chart payloads computed from the database.

mod aggregate;
mod charts;

pub use aggregate::{
    calc_percentage, category_shares, month_buckets, month_counts, month_offset, trailing_months,
    MonthWindows, Window,
};
pub use charts::{
    build_bar_charts, build_line_charts, build_pie_charts, build_stats, AdminCustomer, AgeGroups,
    BarCharts, ChangePercent, DashboardStats, LineCharts, OrderFulfillment, PieCharts,
    RevenueChart, RevenueDistribution, StockAvailability, Totals, Transaction, UserRatio,
};
