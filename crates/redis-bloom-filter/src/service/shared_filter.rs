//! Shared Bloom Filter facade
//!
//! Orchestrates the local membership cache and the bit store behind one
//! shared/exclusive lock:
//!
//! - `append`, `exists`, `exists_and_append` take the lock shared and run
//!   concurrently with each other
//! - `reset` takes it exclusively, waiting for in-flight calls and holding
//!   off new ones until the planes are reinitialized
//!
//! The cache has its own per-shard locks and is only ever a shortcut for
//! positive answers.
//!
//! ## Known inconsistency window
//!
//! `append` loads the cache before the backend transaction and does not
//! undo it when the transaction fails. Until the value's cache shard is
//! cleared, `exists` may report it present although no bit was written.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::{open_store, Backend};
use crate::domain::{validate_sizing, FilterConfig, FilterParams, MembershipCache};
use crate::error::{FilterError, Result, StoreError};
use crate::metrics::{MetricsRecorder, NoOpMetrics, Operation};
use crate::ports::{BitStore, MembershipFilter};

struct FilterState<S> {
    params: FilterParams,
    store: S,
}

/// Bloom filter whose bits live in a shared backend
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
pub struct SharedBloomFilter<S: BitStore = Box<dyn BitStore>> {
    key: String,
    state: RwLock<FilterState<S>>,
    cache: Option<MembershipCache>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl SharedBloomFilter {
    /// Open the filter described by `config` on the injected `backend`.
    ///
    /// Existing planes under `config.key` are reused when all of them are
    /// present; otherwise they are created empty.
    pub fn open(config: &FilterConfig, backend: Backend) -> Result<Self> {
        config.validate()?;
        let params = config.params();
        let store = open_store(config, &params, backend)?;

        info!(
            key = %config.key,
            backend = %store.kind(),
            size_bits = params.size_bits,
            hash_count = params.hash_count,
            partition_size = params.partition_size,
            cache_size = config.cache_size,
            "Opened shared bloom filter"
        );

        Ok(Self::new(config.key.clone(), store, params, config.cache_size))
    }
}

impl<S: BitStore> SharedBloomFilter<S> {
    /// Wrap an already opened `store` whose planes match `params`.
    ///
    /// `cache_size == 0` disables the local cache.
    pub fn new(key: impl Into<String>, store: S, params: FilterParams, cache_size: usize) -> Self {
        let cache = (cache_size > 0).then(|| MembershipCache::new(cache_size));

        Self {
            key: key.into(),
            state: RwLock::new(FilterState { params, store }),
            cache,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Attach a metrics recorder
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The local cache, if enabled.
    pub fn cache(&self) -> Option<&MembershipCache> {
        self.cache.as_ref()
    }

    /// Current sizing.
    pub fn params(&self) -> FilterParams {
        self.state.read().params
    }

    /// Expected false positive rate after `count` insertions at the current
    /// sizing.
    pub fn estimated_false_positive_rate(&self, count: usize) -> f64 {
        self.params().false_positive_rate_at(count)
    }

    /// Insertions the current sizing absorbs before reaching `target_fpr`.
    pub fn capacity_at(&self, target_fpr: f64) -> usize {
        self.params().capacity_at(target_fpr)
    }

    /// Record `value` as a member.
    pub fn append(&self, value: &[u8]) -> Result<()> {
        let state = self.state.read();

        if let Some(cache) = &self.cache {
            cache.load(value);
        }

        state
            .store
            .append(value)
            .map_err(|e| self.backend_failed(Operation::Append, e))?;

        self.metrics.record_append();
        Ok(())
    }

    /// Whether `value` is possibly a member.
    ///
    /// A cache hit answers `true` without a backend call. A backend answer
    /// is returned as is and does not populate the cache.
    pub fn exists(&self, value: &[u8]) -> Result<bool> {
        let state = self.state.read();

        if self.cache.as_ref().is_some_and(|cache| cache.check(value)) {
            self.metrics.record_lookup(true, true);
            return Ok(true);
        }

        let found = state
            .store
            .exists(value)
            .map_err(|e| self.backend_failed(Operation::Exists, e))?;

        self.metrics.record_lookup(found, false);
        Ok(found)
    }

    /// Record `value` and report whether every plane already had its bit
    /// set, i.e. whether the value was possibly a member before this call.
    pub fn exists_and_append(&self, value: &[u8]) -> Result<bool> {
        let state = self.state.read();

        if self
            .cache
            .as_ref()
            .is_some_and(|cache| cache.check_and_load(value))
        {
            self.metrics.record_lookup(true, true);
            return Ok(true);
        }

        let existed = state
            .store
            .exists_and_append(value)
            .map_err(|e| self.backend_failed(Operation::ExistsAndAppend, e))?;

        self.metrics.record_append();
        self.metrics.record_lookup(existed, false);
        Ok(existed)
    }

    /// Discard every member and resize for `expected_items` at `target_fpr`.
    ///
    /// On success the local cache is cleared. On backend failure the cache
    /// is left untouched and the store holds no valid planes, so every
    /// operation fails until a later reset succeeds.
    pub fn reset(&self, expected_items: usize, target_fpr: f64) -> Result<()> {
        validate_sizing(expected_items, target_fpr)?;
        let params = FilterParams::estimate(expected_items, target_fpr);

        let mut state = self.state.write();
        state
            .store
            .initialize(params.hash_count, params.partition_size)
            .map_err(|e| self.backend_failed(Operation::Reset, e))?;
        state.params = params;

        if let Some(cache) = &self.cache {
            cache.reset();
        }

        info!(
            key = %self.key,
            size_bits = params.size_bits,
            hash_count = params.hash_count,
            partition_size = params.partition_size,
            "Reset shared bloom filter"
        );
        self.metrics.record_reset();
        Ok(())
    }

    fn backend_failed(&self, operation: Operation, error: StoreError) -> FilterError {
        warn!(
            key = %self.key,
            operation = operation.as_str(),
            error = %error,
            "Backend transaction failed"
        );
        self.metrics.record_backend_error(operation);
        FilterError::Store(error)
    }
}

impl<S: BitStore> MembershipFilter for SharedBloomFilter<S> {
    fn append(&self, value: &[u8]) -> Result<()> {
        SharedBloomFilter::append(self, value)
    }

    fn exists(&self, value: &[u8]) -> Result<bool> {
        SharedBloomFilter::exists(self, value)
    }

    fn exists_and_append(&self, value: &[u8]) -> Result<bool> {
        SharedBloomFilter::exists_and_append(self, value)
    }

    fn reset(&self, expected_items: usize, target_fpr: f64) -> Result<()> {
        SharedBloomFilter::reset(self, expected_items, target_fpr)
    }

    fn params(&self) -> FilterParams {
        SharedBloomFilter::params(self)
    }
}
