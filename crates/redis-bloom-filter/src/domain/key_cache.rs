//! Local membership cache
//!
//! A bounded, sharded set of value digests that lets the filter answer
//! "probably seen" without a backend round trip.
//!
//! ## Layout
//!
//! - 256 shards, each behind its own `RwLock`
//! - digest = MD5(value); shard = digest[15], key = digest[0..15]
//! - capacity per shard = total / 256
//!
//! ## Eviction
//!
//! A shard at capacity is cleared wholesale before the next insert. There
//! is no per-key LRU; a burst of misses after a shard clear is expected.
//!
//! Presence here is only a positive hint. Absence means "ask the backend",
//! never "not a member". Clearing the cache never affects correctness.

use md5::{Digest, Md5};
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::debug;

/// Number of independently locked shards.
pub const SHARD_COUNT: usize = 1 << 8;

/// Truncated digest stored per cached value.
pub type CacheKey = [u8; 15];

struct CacheShard {
    entries: RwLock<HashSet<CacheKey>>,
}

/// Sharded cache of recently seen value digests.
pub struct MembershipCache {
    shards: Box<[CacheShard]>,
    shard_capacity: usize,
}

impl MembershipCache {
    /// Create a cache holding roughly `total_size` digests.
    ///
    /// Each shard holds at least one entry, so sizes below 256 still cache.
    pub fn new(total_size: usize) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| CacheShard {
                entries: RwLock::new(HashSet::new()),
            })
            .collect();

        Self {
            shards,
            shard_capacity: (total_size / SHARD_COUNT).max(1),
        }
    }

    /// Maximum entries per shard.
    pub fn shard_capacity(&self) -> usize {
        self.shard_capacity
    }

    /// Shard index a value maps to.
    pub fn shard_of(value: &[u8]) -> usize {
        Self::locate(value).0
    }

    /// Insert `value`, clearing its shard first if it is full.
    pub fn load(&self, value: &[u8]) {
        if value.is_empty() {
            return;
        }
        let (index, key) = Self::locate(value);
        let mut entries = self.shards[index].entries.write();
        self.insert_bounded(index, &mut entries, key);
    }

    /// Whether `value` is currently cached. Never mutates.
    pub fn check(&self, value: &[u8]) -> bool {
        if value.is_empty() {
            return false;
        }
        let (index, key) = Self::locate(value);
        self.shards[index].entries.read().contains(&key)
    }

    /// Return `true` if `value` was cached; otherwise cache it and return
    /// `false`.
    pub fn check_and_load(&self, value: &[u8]) -> bool {
        if value.is_empty() {
            return false;
        }
        let (index, key) = Self::locate(value);
        let shard = &self.shards[index];

        if shard.entries.read().contains(&key) {
            return true;
        }

        let mut entries = shard.entries.write();
        // Another thread may have inserted it between the two locks.
        if entries.contains(&key) {
            return true;
        }
        self.insert_bounded(index, &mut entries, key);
        false
    }

    /// Remove `value`, returning whether it was cached.
    pub fn remove(&self, value: &[u8]) -> bool {
        if value.is_empty() {
            return false;
        }
        let (index, key) = Self::locate(value);
        self.shards[index].entries.write().remove(&key)
    }

    /// Clear every shard.
    pub fn reset(&self) {
        for shard in self.shards.iter() {
            shard.entries.write().clear();
        }
    }

    /// Total cached digests across all shards.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.entries.read().len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_bounded(&self, index: usize, entries: &mut HashSet<CacheKey>, key: CacheKey) {
        if entries.len() >= self.shard_capacity {
            debug!(
                shard = index,
                evicted = entries.len(),
                "Membership cache shard full, clearing"
            );
            entries.clear();
        }
        entries.insert(key);
    }

    fn locate(value: &[u8]) -> (usize, CacheKey) {
        let digest = Md5::digest(value);
        let mut key = [0u8; 15];
        key.copy_from_slice(&digest[..15]);
        (digest[15] as usize, key)
    }
}

impl std::fmt::Debug for MembershipCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipCache")
            .field("shards", &SHARD_COUNT)
            .field("shard_capacity", &self.shard_capacity)
            .finish()
    }
}
