//! Invalidation Module
//!
//! Deletes the cache entries made stale by a committed write. Handlers call
//! `InvalidationCoordinator::invalidate` after the database write returns and
//! await it before answering, so the next read after a mutation is a miss.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CacheClient, CacheKey};

// == Invalidation Flags ==
/// Which families of keys a mutation touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationFlags {
    /// Product catalog changed
    pub product: bool,
    /// Orders changed
    pub order: bool,
    /// Dashboard aggregates changed
    pub admin: bool,
    /// Reviews of `product_ids` changed
    pub review: bool,
    /// Coupons changed
    pub coupon: bool,
    pub product_ids: Vec<String>,
    pub order_id: Option<String>,
    pub user_id: Option<String>,
}

impl InvalidationFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(mut self) -> Self {
        self.product = true;
        self
    }

    pub fn order(mut self) -> Self {
        self.order = true;
        self
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn review(mut self) -> Self {
        self.review = true;
        self
    }

    pub fn coupon(mut self) -> Self {
        self.coupon = true;
        self
    }

    pub fn product_id(mut self, id: impl Into<String>) -> Self {
        self.product_ids.push(id.into());
        self
    }

    pub fn product_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn order_id(mut self, id: impl Into<String>) -> Self {
        self.order_id = Some(id.into());
        self
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    /// Keys named by the flags. Listing keys are not included: they come
    /// from the listing index at invalidation time.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys = Vec::new();

        if self.product {
            keys.extend(CacheKey::PRODUCT_FIXED);
            keys.extend(self.product_ids.iter().cloned().map(CacheKey::Product));
        }

        if self.review {
            keys.extend(self.product_ids.iter().cloned().map(CacheKey::Reviews));
        }

        if self.order {
            keys.push(CacheKey::AllOrders);
            if let Some(user) = &self.user_id {
                keys.push(CacheKey::MyOrders(user.clone()));
            }
            if let Some(order) = &self.order_id {
                keys.push(CacheKey::Order(order.clone()));
            }
        }

        if self.admin {
            keys.extend(CacheKey::ADMIN);
        }

        if self.coupon {
            keys.push(CacheKey::AllCoupons);
        }

        keys
    }
}

// == Listing Index ==
/// Listing keys populated since the last product invalidation.
///
/// The listing key space is unbounded, so the coordinator remembers exactly
/// which ones were written instead of scanning the backend.
#[derive(Debug, Default)]
pub struct ListingIndex {
    issued: Mutex<HashMap<String, Instant>>,
}

impl ListingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly populated listing key.
    pub fn record(&self, key: &str) {
        self.lock().insert(key.to_string(), Instant::now());
    }

    /// Removes and returns every recorded key.
    pub fn take_all(&self) -> Vec<String> {
        self.lock().drain().map(|(key, _)| key).collect()
    }

    /// Puts back keys whose deletion failed so the next invalidation retries.
    pub fn restore<I: IntoIterator<Item = String>>(&self, keys: I) {
        let now = Instant::now();
        let mut issued = self.lock();
        for key in keys {
            issued.entry(key).or_insert(now);
        }
    }

    /// Forgets records older than `max_age`; their entries have expired.
    pub fn prune(&self, max_age: Duration) -> usize {
        let mut issued = self.lock();
        let before = issued.len();
        issued.retain(|_, recorded| recorded.elapsed() < max_age);
        before - issued.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Instant>> {
        self.issued.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Invalidation Report ==
/// What an invalidation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Keys a delete was issued for
    pub attempted: usize,
    /// Keys that were present and removed
    pub deleted: usize,
    /// Keys whose delete failed
    pub failed: Vec<String>,
}

impl InvalidationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// == Invalidation Coordinator ==
#[derive(Clone)]
pub struct InvalidationCoordinator {
    cache: CacheClient,
}

impl InvalidationCoordinator {
    pub fn new(cache: CacheClient) -> Self {
        Self { cache }
    }

    /// Deletes every key the flags name, plus all tracked listing keys when
    /// the catalog changed.
    ///
    /// Best effort: a failed delete is logged and the remaining keys are
    /// still attempted. Must run after the triggering write has committed.
    pub async fn invalidate(&self, flags: &InvalidationFlags) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        let fixed: Vec<String> = flags.keys().iter().map(CacheKey::to_string).collect();
        let listings = if flags.product {
            self.cache.listings().take_all()
        } else {
            Vec::new()
        };

        let mut failed_listings = Vec::new();
        for (key, is_listing) in fixed
            .into_iter()
            .map(|k| (k, false))
            .chain(listings.into_iter().map(|k| (k, true)))
        {
            report.attempted += 1;
            match self.cache.delete(&key).await {
                Ok(true) => report.deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "cache invalidation failed for key");
                    if is_listing {
                        failed_listings.push(key.clone());
                    }
                    report.failed.push(key);
                }
            }
        }

        if !failed_listings.is_empty() {
            self.cache.listings().restore(failed_listings);
        }

        self.cache.counters().record_invalidated(report.deleted as u64);
        info!(
            attempted = report.attempted,
            deleted = report.deleted,
            failed = report.failed.len(),
            "cache invalidated"
        );

        report
    }
}
