//! Durable key-value storage for `PartnerBoard`.
//!
//! This crate defines the [`StorageBackend`] trait, the stand-in for the
//! browser's local storage: a flat map of string keys to opaque byte values
//! that survives restarts. It knows nothing about ad blocks or websites; the
//! persistence adapter in `partnerboard-core` handles serialization.
//!
//! Three implementations are provided:
//!
//! - [`RedbBackend`] — default, single-file pure-Rust store (feature `redb-backend`)
//! - [`RocksDbBackend`] — `RocksDB` directory store (feature `rocksdb-backend`)
//! - [`MemoryBackend`] — in-memory, with an optional byte quota, for tests

mod error;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_backend;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDbBackend;

/// A pluggable durable key-value store.
///
/// Keys are UTF-8 strings (e.g. `adBlocks`, `websites`). Values are opaque
/// byte arrays, normally JSON produced by the persistence adapter. A `put`
/// fully replaces whatever was stored under the key before.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a key-value pair, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails, or
    /// [`StorageError::QuotaExceeded`] if the backend enforces a size limit
    /// and the write would exceed it.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Deleting a non-existent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List all keys that start with the given prefix, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the underlying backend fails.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Check whether a key exists in storage.
    ///
    /// The default implementation calls [`get`](StorageBackend::get) and checks
    /// for `Some`. Backends may override this with a more efficient check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }
}
