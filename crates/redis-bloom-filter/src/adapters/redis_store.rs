//! Redis bit store
//!
//! Each plane is a Redis string used as a bitmap under `<key>.<i>`. Every
//! operation is one `MULTI`/`EXEC` pipeline, so the k reads or writes of a
//! call observe and produce a single consistent state:
//!
//! | Operation           | Per plane                      |
//! |---------------------|--------------------------------|
//! | initialize          | `DEL key`, `SETBIT key size 0` |
//! | append              | `SETBIT key offset 1`          |
//! | exists              | `GETBIT key offset`            |
//! | exists_and_append   | `SETBIT key offset 1` (reply = previous bit) |
//!
//! Connection management belongs to the caller's `redis::Client`; the store
//! only keeps a small stack of idle connections so concurrent callers do
//! not reconnect on every operation.

use parking_lot::Mutex;
use redis::{Client, Commands, Connection, ConnectionLike, Pipeline, RedisResult};
use tracing::{debug, info, warn};

use crate::domain::{BackendKind, PlaneSet};
use crate::error::StoreError;
use crate::ports::BitStore;

/// [`BitStore`] backed by a Redis server.
pub struct RedisBitStore {
    client: Client,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
    planes: PlaneSet,
}

impl RedisBitStore {
    /// Open the planes of `key`, reusing them if all `hash_count` exist and
    /// initializing them otherwise.
    pub fn open(
        client: Client,
        key: &str,
        hash_count: usize,
        partition_size: usize,
        max_idle: usize,
    ) -> Result<Self, StoreError> {
        let mut store = Self {
            client,
            idle: Mutex::new(Vec::new()),
            max_idle,
            planes: PlaneSet::new(key, hash_count, partition_size),
        };

        let keys = store.planes.keys_for(hash_count);
        let existing: usize = store.with_connection(|con| con.exists(&keys))?;
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

    /// Run `f` on a pooled connection, opening one if none is idle.
    ///
    /// A connection goes back to the idle stack only if it is still open
    /// and its reply stream is known to be drained.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T, StoreError> {
        let pooled = self.idle.lock().pop();
        let mut con = match pooled {
            Some(con) => con,
            None => self.client.get_connection()?,
        };

        let result = f(&mut con);

        if con.is_open() && is_reusable(&result) {
            let mut idle = self.idle.lock();
            if idle.len() < self.max_idle {
                idle.push(con);
            }
        }

        result.map_err(StoreError::from)
    }

    /// Atomic pipeline issuing `SETBIT key offset 1` for every plane.
    fn setbit_pipeline(&self, value: &[u8]) -> Result<Pipeline, StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, offset) in self.planes.locate(value)? {
            pipe.setbit(key, offset, true);
        }
        Ok(pipe)
    }
}

impl BitStore for RedisBitStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    fn initialize(&mut self, hash_count: usize, partition_size: usize) -> Result<(), StoreError> {
        // Also clear planes left over from a larger previous geometry
        let keys = self
            .planes
            .keys_for(hash_count.max(self.planes.footprint()));

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (i, key) in keys.iter().enumerate() {
            pipe.del(key).ignore();
            if i < hash_count {
                pipe.setbit(key, partition_size, false).ignore();
            }
        }

        match self.with_connection(|con| pipe.query::<()>(con)) {
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
        let pipe = self.setbit_pipeline(value)?;
        self.with_connection(|con| pipe.query::<()>(con))
    }

    fn exists(&self, value: &[u8]) -> Result<bool, StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, offset) in self.planes.locate(value)? {
            pipe.getbit(key, offset);
        }

        let bits: Vec<i64> = self.with_connection(|con| pipe.query(con))?;
        Ok(all_set(&bits))
    }

    fn exists_and_append(&self, value: &[u8]) -> Result<bool, StoreError> {
        let pipe = self.setbit_pipeline(value)?;
        let previous: Vec<i64> = self.with_connection(|con| pipe.query(con))?;
        Ok(all_set(&previous))
    }
}

/// Whether a connection can serve another request after producing
/// `result`. Transport failures may leave unread replies on the socket.
fn is_reusable<T>(result: &RedisResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => !(e.is_io_error() || e.is_connection_dropped() || e.is_timeout()),
    }
}

fn all_set(bits: &[i64]) -> bool {
    !bits.is_empty() && bits.iter().all(|bit| *bit == 1)
}
