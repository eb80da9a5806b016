//! Backends for exercising failure paths in unit tests.

use partnerboard_storage::{MemoryBackend, StorageBackend, StorageError};

/// A backend whose reads and writes always fail.
pub struct BrokenBackend;

#[async_trait::async_trait]
impl StorageBackend for BrokenBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Read {
            key: key.to_owned(),
            reason: "disk on fire".to_owned(),
        })
    }

    async fn put(&self, key: &str, _value: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Write {
            key: key.to_owned(),
            reason: "disk on fire".to_owned(),
        })
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(Vec::new())
    }
}

/// Memory backend pre-filled with raw bytes under `key`.
pub async fn memory_with(key: &str, bytes: &[u8]) -> MemoryBackend {
    let storage = MemoryBackend::new();
    // MemoryBackend without a quota never fails a put.
    let _ = storage.put(key, bytes).await;
    storage
}
