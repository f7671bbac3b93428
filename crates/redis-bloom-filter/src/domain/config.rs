//! Filter configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use redis_bloom_filter::domain::FilterConfigBuilder;
//!
//! let config = FilterConfigBuilder::new()
//!     .key("crawler:seen-urls")
//!     .expected_items(1_000_000)
//!     .target_fpr(0.001)
//!     .cache_size(65_536)
//!     .build()
//!     .expect("Valid config");
//! ```

use crate::error::FilterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::parameters::FilterParams;

/// Storage backends a filter can be opened on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Remote Redis instance, planes stored as string bitmaps
    Redis,
    /// Process-local key space with the same bitmap semantics
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Redis => "redis",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "redis")]
            "redis" => Ok(BackendKind::Redis),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(FilterError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Construction-time configuration of a shared filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Backend type name (`redis` or `memory`)
    pub backend: String,
    /// Namespace of the filter; plane keys are `<key>.<i>`
    pub key: String,
    /// Expected number of items (n)
    pub expected_items: usize,
    /// Target false positive rate (p)
    pub target_fpr: f64,
    /// Total local cache entries, 0 disables the cache
    pub cache_size: usize,
    /// Idle Redis connections kept for reuse
    pub max_idle_connections: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Redis.as_str().to_string(),
            key: "bloom".to_string(),
            expected_items: 100_000,
            target_fpr: 0.01,
            cache_size: 0,
            max_idle_connections: 8,
        }
    }
}

impl FilterConfig {
    /// Parse the configured backend type.
    pub fn backend_kind(&self) -> Result<BackendKind, FilterError> {
        self.backend.parse()
    }

    /// Filter geometry implied by `expected_items` and `target_fpr`.
    pub fn params(&self) -> FilterParams {
        FilterParams::estimate(self.expected_items, self.target_fpr)
    }

    /// Validate configuration before any backend is touched.
    pub fn validate(&self) -> Result<(), FilterError> {
        self.backend_kind()?;

        if self.key.is_empty() {
            return Err(FilterError::InvalidParameters(
                "key cannot be empty".to_string(),
            ));
        }

        validate_sizing(self.expected_items, self.target_fpr)?;

        if self.max_idle_connections == 0 {
            return Err(FilterError::InvalidParameters(
                "max_idle_connections cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder-style method to set the key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Builder-style method to set the cache size
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }
}

/// Reject sizing inputs the estimator formulas are undefined for.
pub fn validate_sizing(expected_items: usize, target_fpr: f64) -> Result<(), FilterError> {
    if expected_items == 0 {
        return Err(FilterError::InvalidParameters(
            "expected_items cannot be 0".to_string(),
        ));
    }

    if !target_fpr.is_finite() || target_fpr <= 0.0 || target_fpr >= 1.0 {
        return Err(FilterError::InvalidFpr { fpr: target_fpr });
    }

    Ok(())
}

/// Builder for FilterConfig with validation
#[derive(Default)]
pub struct FilterConfigBuilder {
    backend: Option<String>,
    key: Option<String>,
    expected_items: Option<usize>,
    target_fpr: Option<f64>,
    cache_size: Option<usize>,
    max_idle_connections: Option<usize>,
}

impl FilterConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend type
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = Some(kind.as_str().to_string());
        self
    }

    /// Set the filter key (namespace)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the expected number of items
    pub fn expected_items(mut self, n: usize) -> Self {
        self.expected_items = Some(n);
        self
    }

    /// Set the target false positive rate, in (0, 1)
    pub fn target_fpr(mut self, fpr: f64) -> Self {
        self.target_fpr = Some(fpr);
        self
    }

    /// Set the total local cache size (0 disables the cache)
    pub fn cache_size(mut self, entries: usize) -> Self {
        self.cache_size = Some(entries);
        self
    }

    /// Set the number of pooled idle Redis connections
    pub fn max_idle_connections(mut self, connections: usize) -> Self {
        self.max_idle_connections = Some(connections);
        self
    }

    /// Build the FilterConfig, validating all parameters
    pub fn build(self) -> Result<FilterConfig, FilterError> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build without validation
    pub fn build_unchecked(self) -> FilterConfig {
        let defaults = FilterConfig::default();

        FilterConfig {
            backend: self.backend.unwrap_or(defaults.backend),
            key: self.key.unwrap_or(defaults.key),
            expected_items: self.expected_items.unwrap_or(defaults.expected_items),
            target_fpr: self.target_fpr.unwrap_or(defaults.target_fpr),
            cache_size: self.cache_size.unwrap_or(defaults.cache_size),
            max_idle_connections: self
                .max_idle_connections
                .unwrap_or(defaults.max_idle_connections),
        }
    }
}
