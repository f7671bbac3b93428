//! Hash functions for the partitioned filter
//!
//! One 64-bit FNV-1 digest per value, split into two 32-bit halves, drives
//! every plane through double hashing: offset(i) = (h1 + h2 * i) mod size.
//!
//! FNV-1 (multiply, then xor) is used rather than FNV-1a so that planes
//! written by other clients of the same key layout hash identically.

use std::hash::Hasher;

const FNV1_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1 hasher.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1Hasher {
    state: u64,
}

impl Fnv1Hasher {
    pub fn new() -> Self {
        Self {
            state: FNV1_OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1Hasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(FNV1_PRIME);
            self.state ^= byte as u64;
        }
    }
}

/// The two base hashes of a value.
///
/// Computed once per operation and reused for every plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    pub h1: usize,
    pub h2: usize,
}

impl Fingerprint {
    /// Hash `value` and split the big-endian digest into (h1, h2).
    pub fn of(value: &[u8]) -> Self {
        let mut hasher = Fnv1Hasher::new();
        hasher.write(value);
        let digest = hasher.finish();

        Self {
            h1: (digest >> 32) as usize,
            h2: (digest & 0xffff_ffff) as usize,
        }
    }

    /// Bit offset of this fingerprint in plane `plane` (1-based).
    pub fn position(&self, plane: usize, size: usize) -> usize {
        position(self.h1, self.h2, plane, size)
    }

    /// Offsets for planes `1..=hash_count`, in plane order.
    pub fn positions(&self, hash_count: usize, size: usize) -> impl Iterator<Item = usize> + '_ {
        (1..=hash_count).map(move |plane| self.position(plane, size))
    }
}

/// Double hashing: offset = (h1 + h2 * plane) mod size.
pub fn position(h1: usize, h2: usize, plane: usize, size: usize) -> usize {
    h1.wrapping_add(h2.wrapping_mul(plane)) % size
}
