//! In-memory storage backend for testing.
//!
//! This backend stores all data in a `BTreeMap` behind a `RwLock`. It is not
//! persistent — all data is lost when the process exits. An optional byte
//! quota mimics the size limit browsers put on local storage, so callers can
//! exercise their write-failure paths without a real disk.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Thread-safe and async-compatible. Clones share the same map. Data is
/// sorted by key, which makes prefix listing efficient via `BTreeMap::range`.
///
/// # Examples
///
/// ```
/// # use partnerboard_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("adBlocks", b"[]").await.unwrap();
/// let val = backend.get("adBlocks").await.unwrap();
/// assert_eq!(val, Some(b"[]".to_vec()));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    /// Maximum total size in bytes (keys plus values), if limited.
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend with no size limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            quota: None,
        }
    }

    /// Create a new empty backend that rejects writes once the stored keys
    /// and values together would exceed `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            quota: Some(bytes),
        }
    }

    /// Total bytes currently stored (keys plus values).
    pub async fn used_bytes(&self) -> usize {
        let data = self.data.read().await;
        data.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().await;

        if let Some(limit) = self.quota {
            let used: usize = data.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = data.get(key).map_or(0, |old| key.len() + old.len());
            let required = used - replaced + key.len() + value.len();
            if required > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    required,
                    limit,
                });
            }
        }

        data.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        let keys = data
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let backend = MemoryBackend::new();
        let result = backend.get("adBlocks").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn put_overwrites_existing() {
        let backend = MemoryBackend::new();
        backend.put("websites", b"[1]").await.unwrap();
        backend.put("websites", b"[2]").await.unwrap();
        let val = backend.get("websites").await.unwrap();
        assert_eq!(val, Some(b"[2]".to_vec()));
    }

    #[tokio::test]
    async fn delete_nonexistent_is_noop() {
        let backend = MemoryBackend::new();
        backend.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn list_with_prefix() {
        let backend = MemoryBackend::new();
        backend.put("adBlocks", b"1").await.unwrap();
        backend.put("adBlocks.bak", b"2").await.unwrap();
        backend.put("websites", b"3").await.unwrap();

        let keys = backend.list("adBlocks").await.unwrap();
        assert_eq!(keys, vec!["adBlocks", "adBlocks.bak"]);
    }

    #[tokio::test]
    async fn exists_reflects_puts_and_deletes() {
        let backend = MemoryBackend::new();
        assert!(!backend.exists("key").await.unwrap());
        backend.put("key", b"val").await.unwrap();
        assert!(backend.exists("key").await.unwrap());
        backend.delete("key").await.unwrap();
        assert!(!backend.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend.put("key", b"val").await.unwrap();
        let val = clone.get("key").await.unwrap();
        assert_eq!(val, Some(b"val".to_vec()));
    }

    #[tokio::test]
    async fn quota_rejects_oversized_write_and_keeps_old_value() {
        // "key" + "1234" = 7 bytes.
        let backend = MemoryBackend::with_quota(8);
        backend.put("key", b"1234").await.unwrap();

        let err = backend.put("key", b"123456").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded { required: 9, limit: 8, .. }
        ));
        assert_eq!(backend.get("key").await.unwrap(), Some(b"1234".to_vec()));
    }

    #[tokio::test]
    async fn quota_counts_replacement_not_sum() {
        let backend = MemoryBackend::with_quota(8);
        backend.put("key", b"12345").await.unwrap();
        // Replacing a value of the same size stays within the limit.
        backend.put("key", b"abcde").await.unwrap();
        assert_eq!(backend.used_bytes().await, 8);
    }

    #[tokio::test]
    async fn quota_spans_all_keys() {
        let backend = MemoryBackend::with_quota(10);
        backend.put("a", b"1234").await.unwrap();
        backend.put("b", b"1234").await.unwrap();
        let err = backend.put("c", b"1").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }
}
