//! Outbound Ports (Driven Ports)
//!
//! The filter facade depends on a partitioned bit array it does not own.
//! Implementations live in `adapters/`.

use crate::domain::BackendKind;
use crate::error::StoreError;

/// Partitioned bit array backing a shared filter (Driven Port)
///
/// Every multi-plane operation is one all-or-nothing backend transaction.
/// On `Err` the caller must assume no plane was touched.
pub trait BitStore: Send + Sync {
    /// Backend this store talks to.
    fn kind(&self) -> BackendKind;

    /// Reset all `hash_count` planes to `partition_size` zero bits.
    ///
    /// On failure the store keeps no plane references and every later
    /// operation fails with [`StoreError::Uninitialized`] until an
    /// initialization succeeds.
    fn initialize(&mut self, hash_count: usize, partition_size: usize) -> Result<(), StoreError>;

    /// Set the value's bit in every plane.
    fn append(&self, value: &[u8]) -> Result<(), StoreError>;

    /// Whether the value's bit is set in every plane.
    fn exists(&self, value: &[u8]) -> Result<bool, StoreError>;

    /// Set the value's bit in every plane and report whether all of them
    /// were already set before the call.
    fn exists_and_append(&self, value: &[u8]) -> Result<bool, StoreError>;
}

impl<S: BitStore + ?Sized> BitStore for Box<S> {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn initialize(&mut self, hash_count: usize, partition_size: usize) -> Result<(), StoreError> {
        (**self).initialize(hash_count, partition_size)
    }

    fn append(&self, value: &[u8]) -> Result<(), StoreError> {
        (**self).append(value)
    }

    fn exists(&self, value: &[u8]) -> Result<bool, StoreError> {
        (**self).exists(value)
    }

    fn exists_and_append(&self, value: &[u8]) -> Result<bool, StoreError> {
        (**self).exists_and_append(value)
    }
}
