//! Bit plane bookkeeping
//!
//! A filter is k independent bit arrays ("planes") of `partition_size` bits,
//! stored under `<key>.1` .. `<key>.k`. Planes are created and destroyed
//! together; a store whose last initialization failed holds no valid planes
//! and refuses every operation.

use crate::error::StoreError;

use super::hash_functions::Fingerprint;

/// Backend key of plane `plane` (1-based) of filter `key`.
pub fn plane_key(key: &str, plane: usize) -> String {
    format!("{}.{}", key, plane)
}

/// The plane keys and geometry a store currently addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaneSet {
    key: String,
    planes: Vec<String>,
    partition_size: usize,
    footprint: usize,
}

impl PlaneSet {
    /// Plane set for `hash_count` planes of `partition_size` bits.
    pub fn new(key: impl Into<String>, hash_count: usize, partition_size: usize) -> Self {
        let mut set = Self {
            key: key.into(),
            planes: Vec::new(),
            partition_size,
            footprint: 0,
        };
        set.adopt(hash_count, partition_size);
        set
    }

    /// Filter key (namespace) of this plane set.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Keys the planes would have for `hash_count` planes.
    pub fn keys_for(&self, hash_count: usize) -> Vec<String> {
        (1..=hash_count)
            .map(|plane| plane_key(&self.key, plane))
            .collect()
    }

    /// Switch to a new geometry. Called once the backend has committed it.
    pub fn adopt(&mut self, hash_count: usize, partition_size: usize) {
        self.planes = self.keys_for(hash_count);
        self.partition_size = partition_size;
        self.footprint = hash_count;
    }

    /// Drop every plane reference after a failed initialization.
    pub fn invalidate(&mut self) {
        self.planes.clear();
    }

    pub fn is_valid(&self) -> bool {
        !self.planes.is_empty()
    }

    /// Current plane keys, in plane order. Empty when invalid.
    pub fn keys(&self) -> &[String] {
        &self.planes
    }

    pub fn hash_count(&self) -> usize {
        self.planes.len()
    }

    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    /// Plane count of the last committed geometry. Survives `invalidate`,
    /// so a later initialization still knows which keys it may have to
    /// delete.
    pub fn footprint(&self) -> usize {
        self.footprint
    }

    /// `(plane key, bit offset)` for every plane, hashing `value` once.
    pub fn locate(&self, value: &[u8]) -> Result<Vec<(&str, usize)>, StoreError> {
        if !self.is_valid() {
            return Err(StoreError::Uninitialized);
        }

        let fingerprint = Fingerprint::of(value);
        Ok(self
            .planes
            .iter()
            .zip(fingerprint.positions(self.planes.len(), self.partition_size))
            .map(|(key, offset)| (key.as_str(), offset))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_keys_are_one_based() {
        assert_eq!(plane_key("seen", 1), "seen.1");

        let planes = PlaneSet::new("seen", 3, 64);
        assert_eq!(planes.keys(), ["seen.1", "seen.2", "seen.3"]);
        assert_eq!(planes.hash_count(), 3);
    }

    #[test]
    fn test_locate_matches_fingerprint_positions() {
        let planes = PlaneSet::new("seen", 7, 136_930);
        let fingerprint = Fingerprint::of(b"hello");

        let located = planes.locate(b"hello").unwrap();

        assert_eq!(located.len(), 7);
        for (i, (key, offset)) in located.iter().enumerate() {
            assert_eq!(*key, format!("seen.{}", i + 1));
            assert_eq!(*offset, fingerprint.position(i + 1, 136_930));
            assert!(*offset < 136_930);
        }
    }

    #[test]
    fn test_invalidated_set_refuses_locate() {
        let mut planes = PlaneSet::new("seen", 3, 64);
        planes.invalidate();

        assert!(!planes.is_valid());
        assert!(matches!(planes.locate(b"x"), Err(StoreError::Uninitialized)));
    }

    #[test]
    fn test_adopt_rebuilds_keys_for_new_geometry() {
        let mut planes = PlaneSet::new("seen", 3, 64);
        planes.invalidate();

        planes.adopt(5, 128);

        assert!(planes.is_valid());
        assert_eq!(planes.hash_count(), 5);
        assert_eq!(planes.partition_size(), 128);
        assert_eq!(planes.keys().last().map(String::as_str), Some("seen.5"));
    }

    #[test]
    fn test_footprint_survives_invalidate() {
        let mut planes = PlaneSet::new("seen", 9, 64);
        planes.invalidate();

        assert_eq!(planes.hash_count(), 0);
        assert_eq!(planes.footprint(), 9, "Stale keys are still tracked");

        planes.adopt(4, 64);
        assert_eq!(planes.footprint(), 4);
    }
}
