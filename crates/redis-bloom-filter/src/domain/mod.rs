//! Domain Layer - Pure filter logic
//!
//! This layer contains:
//! - Parameter estimation (m, k, rate, capacity)
//! - FNV-1 fingerprinting and double-hashing positions
//! - Bit plane naming and bookkeeping
//! - The sharded local membership cache
//! - Configuration
//!
//! RULES:
//! - No backend I/O
//! - No async code

pub mod config;
pub mod hash_functions;
pub mod key_cache;
pub mod parameters;
pub mod planes;

pub use config::{validate_sizing, BackendKind, FilterConfig, FilterConfigBuilder};
pub use hash_functions::{position, Fingerprint, Fnv1Hasher};
pub use key_cache::{CacheKey, MembershipCache, SHARD_COUNT};
pub use parameters::{
    estimate_capacity, estimate_false_positive_rate, estimate_parameters, FilterParams,
};
pub use planes::{plane_key, PlaneSet};
