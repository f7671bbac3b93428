//! # Redis Bloom Filter
//!
//! A partitioned Bloom filter whose bits live in a shared backend, so many
//! processes can record and test membership in one set.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `FilterParams`: m/k estimation and the inverse rate/capacity queries
//!   - `Fingerprint`: FNV-1 64 double hashing into plane offsets
//!   - `PlaneSet`: names and geometry of the k bit planes
//!   - `MembershipCache`: 256-shard local cache of known members
//!   - `FilterConfig` / `FilterConfigBuilder`: configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `MembershipFilter`: Driving port (inbound API)
//!   - `BitStore`: Driven port (the partitioned bit array)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `SharedBloomFilter`: cache plus store under a reset lock
//!
//! - **Adapters Layer** (`adapters/`): Backends
//!   - `RedisBitStore`: planes as Redis bitmaps (feature `redis`)
//!   - `MemoryBitStore`: process-local key space with Redis bitmap semantics
//!
//! ## Storage Layout
//!
//! A filter under key `K` with k hash functions owns the backend keys
//! `K.1` through `K.k`. Each is a bitmap of `ceil(m / k)` bits. Any
//! process using the same key and sizing sees the same set.
//!
//! ## Guarantees
//!
//! - No false negatives: an appended value always tests present, unless
//!   the backend rejected the append or a reset happened since
//! - False positive rate stays near the target while the item count stays
//!   at or below the expected count
//! - Each operation's k plane reads or writes are one backend transaction
//!
//! ## Usage Example
//!
//! ```ignore
//! use redis_bloom_filter::{FilterConfigBuilder, SharedBloomFilter};
//!
//! let config = FilterConfigBuilder::new()
//!     .key("crawler:seen")
//!     .expected_items(1_000_000)
//!     .target_fpr(0.001)
//!     .cache_size(65_536)
//!     .build()?;
//!
//! let client = redis::Client::open("redis://127.0.0.1/")?;
//! let filter = SharedBloomFilter::open(&config, client.into())?;
//!
//! if !filter.exists_and_append(b"https://example.com/")? {
//!     // first time seen
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{open_store, Backend, MemoryBackend, MemoryBitStore};
#[cfg(feature = "redis")]
pub use adapters::RedisBitStore;
pub use domain::{
    estimate_capacity, estimate_false_positive_rate, estimate_parameters, BackendKind,
    FilterConfig, FilterConfigBuilder, FilterParams, MembershipCache,
};
pub use error::{FilterError, StoreError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{BitStore, MembershipFilter};
pub use service::SharedBloomFilter;
