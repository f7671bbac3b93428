//! In-memory bit store
//!
//! `MemoryBackend` is a process-local key space of bitmaps with the same
//! semantics the Redis adapter relies on:
//!
//! - `SETBIT` grows the bitmap to the next byte boundary and returns the
//!   previous bit
//! - `GETBIT` past the end reads 0
//! - bits are numbered MSB-first within each byte
//!
//! A transaction runs entirely under the key space lock, so it commits all
//! of its commands or none of them. Cloning the backend shares the key
//! space, which lets several filters (standing in for several processes)
//! open the same key.

use bitvec::prelude::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{BackendKind, PlaneSet};
use crate::error::StoreError;
use crate::ports::BitStore;

type Bitmap = BitVec<u8, Msb0>;

#[derive(Default)]
struct Keyspace {
    bitmaps: HashMap<String, Bitmap>,
    unavailable: bool,
}

/// Commands available inside a [`MemoryBackend::transaction`].
pub struct MemoryTransaction<'a> {
    bitmaps: &'a mut HashMap<String, Bitmap>,
}

impl MemoryTransaction<'_> {
    /// Delete `key`, returning whether it existed.
    pub fn del(&mut self, key: &str) -> bool {
        self.bitmaps.remove(key).is_some()
    }

    /// Set the bit at `offset`, growing the bitmap as needed. Returns the
    /// previous bit.
    pub fn setbit(&mut self, key: &str, offset: usize, value: bool) -> bool {
        let bitmap = self.bitmaps.entry(key.to_string()).or_default();
        if bitmap.len() <= offset {
            let bytes = offset / 8 + 1;
            bitmap.resize(bytes * 8, false);
        }
        bitmap.replace(offset, value)
    }

    /// Read the bit at `offset`; 0 past the end or for a missing key.
    pub fn getbit(&self, key: &str, offset: usize) -> bool {
        self.bitmaps
            .get(key)
            .and_then(|bitmap| bitmap.get(offset).map(|bit| *bit))
            .unwrap_or(false)
    }
}

/// Shared, process-local bitmap key space.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Keyspace>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent transaction fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    /// Number of `keys` that exist.
    pub fn exists(&self, keys: &[String]) -> Result<usize, StoreError> {
        let keyspace = self.inner.lock();
        if keyspace.unavailable {
            return Err(Self::refused());
        }
        Ok(keys
            .iter()
            .filter(|key| keyspace.bitmaps.contains_key(key.as_str()))
            .count())
    }

    /// Run `f` as one atomic transaction.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut MemoryTransaction<'_>) -> T,
    ) -> Result<T, StoreError> {
        let mut keyspace = self.inner.lock();
        if keyspace.unavailable {
            return Err(Self::refused());
        }
        let mut tx = MemoryTransaction {
            bitmaps: &mut keyspace.bitmaps,
        };
        Ok(f(&mut tx))
    }

    /// Length in bits of the bitmap at `key`, if it exists.
    pub fn bit_len(&self, key: &str) -> Option<usize> {
        self.inner.lock().bitmaps.get(key).map(|bitmap| bitmap.len())
    }

    /// Number of set bits at `key`.
    pub fn count_ones(&self, key: &str) -> usize {
        self.inner
            .lock()
            .bitmaps
            .get(key)
            .map_or(0, |bitmap| bitmap.count_ones())
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().bitmaps.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn refused() -> StoreError {
        StoreError::Unavailable("memory backend marked unavailable".to_string())
    }
}

/// [`BitStore`] over a [`MemoryBackend`].
pub struct MemoryBitStore {
    backend: MemoryBackend,
    planes: PlaneSet,
}

impl MemoryBitStore {
    /// Open the planes of `key`, reusing them if all `hash_count` exist and
    /// initializing them otherwise.
    pub fn open(
        backend: MemoryBackend,
        key: &str,
        hash_count: usize,
        partition_size: usize,
    ) -> Result<Self, StoreError> {
        let mut store = Self {
            backend,
            planes: PlaneSet::new(key, hash_count, partition_size),
        };

        let existing = store.backend.exists(&store.planes.keys_for(hash_count))?;
        if existing < hash_count {
            store.initialize(hash_count, partition_size)?;
        } else {
            debug!(key = key, hash_count = hash_count, "Reusing existing bit planes");
        }

        Ok(store)
    }

    /// The plane set currently addressed.
    pub fn planes(&self) -> &PlaneSet {
        &self.planes
    }
}

impl BitStore for MemoryBitStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn initialize(&mut self, hash_count: usize, partition_size: usize) -> Result<(), StoreError> {
        // Also clear planes left over from a larger previous geometry
        let keys = self
            .planes
            .keys_for(hash_count.max(self.planes.footprint()));

        let result = self.backend.transaction(|tx| {
            for (i, key) in keys.iter().enumerate() {
                tx.del(key);
                if i < hash_count {
                    tx.setbit(key, partition_size, false);
                }
            }
        });

        match result {
            Ok(()) => {
                self.planes.adopt(hash_count, partition_size);
                info!(
                    key = self.planes.key(),
                    hash_count = hash_count,
                    partition_size = partition_size,
                    "Initialized bit planes"
                );
                Ok(())
            }
            Err(e) => {
                self.planes.invalidate();
                warn!(key = self.planes.key(), error = %e, "Bit plane initialization failed");
                Err(e)
            }
        }
    }

    fn append(&self, value: &[u8]) -> Result<(), StoreError> {
        let located = self.planes.locate(value)?;
        self.backend.transaction(|tx| {
            for (key, offset) in &located {
                tx.setbit(key, *offset, true);
            }
        })
    }

    fn exists(&self, value: &[u8]) -> Result<bool, StoreError> {
        let located = self.planes.locate(value)?;
        self.backend
            .transaction(|tx| located.iter().all(|(key, offset)| tx.getbit(key, *offset)))
    }

    fn exists_and_append(&self, value: &[u8]) -> Result<bool, StoreError> {
        let located = self.planes.locate(value)?;
        self.backend.transaction(|tx| {
            // Set every bit even once a previous value reads 0
            located
                .iter()
                .map(|(key, offset)| tx.setbit(key, *offset, true))
                .fold(true, |all_set, was_set| all_set && was_set)
        })
    }
}
