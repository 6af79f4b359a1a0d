//! Proxy metrics for request and failure counts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kind of proxy event being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Chat completion request
    ChatRequest,
    /// Chat completion request with streaming
    ChatStreamRequest,
    /// Embedding request
    EmbeddingRequest,
    /// Model list request
    ModelsRequest,
    /// Upstream request failed
    UpstreamError,
    /// A telemetry sink failed
    TelemetryFailure,
}

/// Proxy metrics collector.
///
/// Tracks event counts across all clones of the shared app state.
#[derive(Clone, Debug)]
pub struct ProxyMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Event counts by kind
    counts: [AtomicU64; 6],
}

impl ProxyMetrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                counts: [
                    AtomicU64::new(0), // ChatRequest
                    AtomicU64::new(0), // ChatStreamRequest
                    AtomicU64::new(0), // EmbeddingRequest
                    AtomicU64::new(0), // ModelsRequest
                    AtomicU64::new(0), // UpstreamError
                    AtomicU64::new(0), // TelemetryFailure
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

impl Default for ProxyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let metrics = ProxyMetrics::new();
        metrics.record(MetricKind::ChatRequest);
        metrics.record(MetricKind::ChatRequest);
        metrics.record(MetricKind::TelemetryFailure);

        assert_eq!(metrics.count(MetricKind::ChatRequest), 2);
        assert_eq!(metrics.count(MetricKind::TelemetryFailure), 1);
        assert_eq!(metrics.count(MetricKind::EmbeddingRequest), 0);
    }

    #[test]
    fn test_clones_share_counts() {
        let metrics = ProxyMetrics::new();
        let clone = metrics.clone();
        clone.record(MetricKind::UpstreamError);
        assert_eq!(metrics.count(MetricKind::UpstreamError), 1);
    }
}
