//! Store metrics for operation counts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kind of store operation being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// User insert-or-update
    UserUpsert,
    /// User fetch by email or inquiry
    UserLookup,
    /// KYC status update
    StatusUpdate,
    /// Checkout insert
    CheckoutInsert,
    /// Checkout status sync
    CheckoutSync,
    /// Checkout fetch
    CheckoutLookup,
}

/// Store metrics collector.
///
/// Tracks operation counts across all clones of a [`crate::Store`].
#[derive(Clone, Debug)]
pub struct StoreMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Operation counts by kind
    counts: [AtomicU64; 6],
}

impl StoreMetrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                counts: [
                    AtomicU64::new(0), // UserUpsert
                    AtomicU64::new(0), // UserLookup
                    AtomicU64::new(0), // StatusUpdate
                    AtomicU64::new(0), // CheckoutInsert
                    AtomicU64::new(0), // CheckoutSync
                    AtomicU64::new(0), // CheckoutLookup
                ],
            }),
        }
    }

    /// Records a metric occurrence.
    pub fn record(&self, kind: MetricKind) {
        self.inner.counts[kind as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the count for a specific metric.
    pub fn count(&self, kind: MetricKind) -> u64 {
        self.inner.counts[kind as usize].load(Ordering::Relaxed)
    }

    /// Resets all metrics to zero.
    pub fn reset(&self) {
        for count in &self.inner.counts {
            count.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}
