//! Error types for the shared Bloom filter

use thiserror::Error;

use crate::domain::BackendKind;

/// Errors surfaced by the filter facade
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("Backend mismatch: configured {configured}, connection is {actual}")]
    BackendMismatch {
        configured: BackendKind,
        actual: BackendKind,
    },

    #[error("Invalid false positive rate: {fpr} (must be between 0 and 1)")]
    InvalidFpr { fpr: f64 },

    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("Backend transaction failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors from a bit store backend
///
/// Any of these means the transaction was not applied.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Bit planes are not initialized")]
    Uninitialized,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;
