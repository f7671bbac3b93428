//! Adapters Layer (Driven Adapters)
//!
//! Implementations of the [`BitStore`] port:
//!
//! - `RedisBitStore` - planes as Redis bitmaps, `MULTI`/`EXEC` per operation
//! - `MemoryBitStore` - process-local key space with the same semantics
//!
//! A [`Backend`] is the connection handle the caller injects; it selects
//! the adapter.

pub mod memory_store;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use memory_store::{MemoryBackend, MemoryBitStore, MemoryTransaction};
#[cfg(feature = "redis")]
pub use redis_store::RedisBitStore;

use crate::domain::{BackendKind, FilterConfig, FilterParams};
use crate::error::FilterError;
use crate::ports::BitStore;

/// Connection handle to the storage a filter lives in.
#[derive(Clone)]
pub enum Backend {
    #[cfg(feature = "redis")]
    Redis(redis::Client),
    Memory(MemoryBackend),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            #[cfg(feature = "redis")]
            Backend::Redis(_) => BackendKind::Redis,
            Backend::Memory(_) => BackendKind::Memory,
        }
    }
}

impl From<MemoryBackend> for Backend {
    fn from(backend: MemoryBackend) -> Self {
        Backend::Memory(backend)
    }
}

#[cfg(feature = "redis")]
impl From<redis::Client> for Backend {
    fn from(client: redis::Client) -> Self {
        Backend::Redis(client)
    }
}

/// Open (or create) the planes described by `config` and `params` on
/// `backend`.
///
/// Fails with `BackendMismatch` when the handle is not of the configured
/// backend type.
pub fn open_store(
    config: &FilterConfig,
    params: &FilterParams,
    backend: Backend,
) -> Result<Box<dyn BitStore>, FilterError> {
    let configured = config.backend_kind()?;
    if configured != backend.kind() {
        return Err(FilterError::BackendMismatch {
            configured,
            actual: backend.kind(),
        });
    }

    let store: Box<dyn BitStore> = match backend {
        #[cfg(feature = "redis")]
        Backend::Redis(client) => Box::new(RedisBitStore::open(
            client,
            &config.key,
            params.hash_count,
            params.partition_size,
            config.max_idle_connections,
        )?),
        Backend::Memory(memory) => Box::new(MemoryBitStore::open(
            memory,
            &config.key,
            params.hash_count,
            params.partition_size,
        )?),
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FilterConfigBuilder;

    #[test]
    fn test_open_memory_store() {
        let config = FilterConfigBuilder::new()
            .backend(BackendKind::Memory)
            .key("seen")
            .expected_items(1_000)
            .build()
            .unwrap();
        let memory = MemoryBackend::new();

        let store = open_store(&config, &config.params(), memory.clone().into()).unwrap();

        assert_eq!(store.kind(), BackendKind::Memory);
        assert_eq!(memory.keys().len(), config.params().hash_count);
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_backend_mismatch_is_rejected() {
        let config = FilterConfig::default();
        let result = open_store(&config, &config.params(), MemoryBackend::new().into());

        assert!(matches!(
            result,
            Err(FilterError::BackendMismatch {
                configured: BackendKind::Redis,
                actual: BackendKind::Memory,
            })
        ));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let config = FilterConfig {
            backend: "cassandra".to_string(),
            ..Default::default()
        };
        let result = open_store(&config, &config.params(), MemoryBackend::new().into());

        assert!(matches!(result, Err(FilterError::UnsupportedBackend(_))));
    }
}
