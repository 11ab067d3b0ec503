//! Aggregation primitives behind the dashboard: calendar windows,
//! percentage change, month histograms and category shares.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, TimeZone, Utc};

use crate::db::Timestamped;

// == Window ==
/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// The current and previous calendar months around a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindows {
    pub this_month: Window,
    pub last_month: Window,
}

impl MonthWindows {
    pub fn around(now: DateTime<Utc>) -> Self {
        let this_start = month_start(now.year(), now.month());
        let next_start = this_start + Months::new(1);
        let last_start = this_start - Months::new(1);

        Self {
            this_month: Window {
                start: this_start,
                end: next_start,
            },
            last_month: Window {
                start: last_start,
                end: this_start,
            },
        }
    }
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Window covering the last `months` calendar months, the current one included.
pub fn trailing_months(now: DateTime<Utc>, months: u32) -> Window {
    let this_start = month_start(now.year(), now.month());
    Window {
        start: this_start - Months::new(months.saturating_sub(1)),
        end: this_start + Months::new(1),
    }
}

// == Percentage Change ==
/// Percentage change from `previous` to `current`, rounded to a whole number.
///
/// A zero `previous` yields `current * 100` instead of dividing by zero.
pub fn calc_percentage(current: f64, previous: f64) -> i64 {
    let percent = if previous == 0.0 {
        current * 100.0
    } else {
        (current - previous) / previous * 100.0
    };
    percent.round() as i64
}

// == Month Buckets ==
/// Months between `date` and `today`, 0 for the same calendar month.
pub fn month_offset(today: DateTime<Utc>, date: DateTime<Utc>) -> i64 {
    i64::from(today.year() - date.year()) * 12 + i64::from(today.month()) - i64::from(date.month())
}

/// Adds `value(doc)` to the bucket of each document's month. The last bucket
/// is the current month; documents older than `length` months, or dated in
/// the future, are ignored.
pub fn month_buckets<D, F>(length: usize, today: DateTime<Utc>, docs: &[D], value: F) -> Vec<f64>
where
    D: Timestamped,
    F: Fn(&D) -> f64,
{
    let mut buckets = vec![0.0; length];
    for doc in docs {
        let offset = month_offset(today, doc.created_at());
        if offset >= 0 && (offset as usize) < length {
            buckets[length - 1 - offset as usize] += value(doc);
        }
    }
    buckets
}

/// Document counts per month.
pub fn month_counts<D: Timestamped>(length: usize, today: DateTime<Utc>, docs: &[D]) -> Vec<u64> {
    month_buckets(length, today, docs, |_| 1.0)
        .into_iter()
        .map(|count| count as u64)
        .collect()
}

// == Category Shares ==
/// Percentage of all products in each category, rounded.
pub fn category_shares(counts: &[(String, usize)], total: usize) -> BTreeMap<String, i64> {
    counts
        .iter()
        .map(|(category, count)| {
            let share = if total == 0 {
                0
            } else {
                (*count as f64 / total as f64 * 100.0).round() as i64
            };
            (category.clone(), share)
        })
        .collect()
}
