//! Service Layer
//!
//! The filter facade: orchestrates the local cache and the bit store port
//! under the reset lock.

pub mod shared_filter;

pub use shared_filter::SharedBloomFilter;
