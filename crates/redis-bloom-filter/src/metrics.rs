//! Metrics hooks for shared filter operations
//!
//! Counts operations, cache short-circuits and backend failures so callers
//! can see how much traffic the local cache absorbs.
//!
//! ## Usage
//!
//! ```ignore
//! use redis_bloom_filter::metrics::Metrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(Metrics::new());
//! let filter = SharedBloomFilter::open(&config, backend)?.with_metrics(metrics.clone());
//!
//! filter.exists(b"value")?;
//! println!("cache hit rate: {}", metrics.cache_hit_rate());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Filter operation kinds, for labelling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Append,
    Exists,
    ExistsAndAppend,
    Reset,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Append => "append",
            Operation::Exists => "exists",
            Operation::ExistsAndAppend => "exists_and_append",
            Operation::Reset => "reset",
        }
    }
}

/// Metrics collector for filter operations
///
/// Thread-safe counters, all updated with relaxed ordering.
#[derive(Default)]
pub struct Metrics {
    /// Append and ExistsAndAppend calls
    pub appends: AtomicU64,
    /// Exists and ExistsAndAppend calls
    pub lookups: AtomicU64,
    /// Lookups that reported "possibly present"
    pub lookups_positive: AtomicU64,
    /// Lookups answered by the local cache
    pub cache_hits: AtomicU64,
    /// Operations the backend rejected
    pub backend_errors: AtomicU64,
    /// Successful resets
    pub resets: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            appends: self.appends.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            lookups_positive: self.lookups_positive.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }

    /// Share of lookups answered without a backend round trip
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.lookups.load(Ordering::Relaxed);
        if lookups > 0 {
            self.cache_hits.load(Ordering::Relaxed) as f64 / lookups as f64
        } else {
            0.0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.appends.store(0, Ordering::Relaxed);
        self.lookups.store(0, Ordering::Relaxed);
        self.lookups_positive.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.backend_errors.store(0, Ordering::Relaxed);
        self.resets.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub appends: u64,
    pub lookups: u64,
    pub lookups_positive: u64,
    pub cache_hits: u64,
    pub backend_errors: u64,
    pub resets: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to forward filter activity to an external metrics
/// system.
pub trait MetricsRecorder: Send + Sync {
    /// A value was recorded (Append or ExistsAndAppend)
    fn record_append(&self);

    /// A membership answer was produced; `cached` if no backend call was made
    fn record_lookup(&self, found: bool, cached: bool);

    /// The backend rejected `operation`
    fn record_backend_error(&self, operation: Operation);

    /// The filter was reinitialized
    fn record_reset(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_append(&self) {}
    fn record_lookup(&self, _: bool, _: bool) {}
    fn record_backend_error(&self, _: Operation) {}
    fn record_reset(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_append(&self) {
        self.appends.fetch_add(1, Ordering::Relaxed);
    }

    fn record_lookup(&self, found: bool, cached: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if found {
            self.lookups_positive.fetch_add(1, Ordering::Relaxed);
        }
        if cached {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_backend_error(&self, _operation: Operation) {
        self.backend_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_lookups() {
        let metrics = Metrics::new();

        metrics.record_lookup(true, true);
        metrics.record_lookup(false, false);
        metrics.record_lookup(true, false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lookups, 3);
        assert_eq!(snapshot.lookups_positive, 2);
        assert_eq!(snapshot.cache_hits, 1);
    }

    #[test]
    fn test_cache_hit_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.cache_hit_rate(), 0.0);

        for _ in 0..30 {
            metrics.record_lookup(true, true);
        }
        for _ in 0..70 {
            metrics.record_lookup(false, false);
        }

        assert!((metrics.cache_hit_rate() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();

        metrics.record_append();
        metrics.record_lookup(true, false);
        metrics.record_backend_error(Operation::Append);
        metrics.record_reset();

        metrics.reset();

        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_append();
        metrics.record_lookup(true, true);
        metrics.record_backend_error(Operation::Reset);
        metrics.record_reset();
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(Operation::ExistsAndAppend.as_str(), "exists_and_append");
        assert_eq!(Operation::Reset.as_str(), "reset");
    }
}
