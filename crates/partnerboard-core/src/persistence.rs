//! Load and save whole collections as JSON under a single storage key.
//!
//! The adapter owns nothing; stores hand it a snapshot to write or a default
//! to fall back on. Loading never fails outright: an absent key yields the
//! default silently, while unreadable or malformed data yields the default
//! *and* a [`PersistenceError`] the caller can surface.

use std::sync::Arc;

use partnerboard_storage::StorageBackend;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::PersistenceError;

/// Storage key for the ad block collection.
pub const AD_BLOCKS_KEY: &str = "adBlocks";

/// Storage key for the partner website collection.
pub const WEBSITES_KEY: &str = "websites";

/// Key under which undecodable bytes from `key` are preserved.
#[must_use]
pub fn corrupt_backup_key(key: &str) -> String {
    format!("{key}.corrupt")
}

/// Where a loaded collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from durable storage.
    Stored,
    /// The caller-supplied default, because nothing usable was stored.
    Default,
}

/// Result of [`PersistenceAdapter::load`].
#[derive(Debug)]
pub struct Loaded<T> {
    /// The collection to use.
    pub value: T,
    /// Whether `value` came from storage or the default.
    pub source: LoadSource,
    /// Why the stored copy was rejected, if it was.
    pub error: Option<PersistenceError>,
}

/// Outcome of a mutation that was applied in memory.
///
/// `warning` is set when the durable write failed. The change still stands
/// for the rest of the session; it just will not survive a restart.
#[derive(Debug)]
pub struct Saved<T> {
    /// The record as it is now held in memory.
    pub value: T,
    /// The write failure, if the durable copy is stale.
    pub warning: Option<PersistenceError>,
}

impl<T> Saved<T> {
    /// Whether the durable copy matches the in-memory state.
    pub fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }

    /// Drop the warning and keep the record.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// JSON serialization of collections to and from a [`StorageBackend`].
#[derive(Clone)]
pub struct PersistenceAdapter {
    storage: Arc<dyn StorageBackend>,
}

impl PersistenceAdapter {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Load the value stored under `key`, or `default` if there is none.
    ///
    /// A storage read failure or a value that does not decode as `T` both
    /// fall back to `default`, with the cause in [`Loaded::error`].
    pub async fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> Loaded<T> {
        let bytes = match self.storage.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "nothing stored, using defaults");
                return Loaded {
                    value: default,
                    source: LoadSource::Default,
                    error: None,
                };
            }
            Err(e) => {
                warn!(key, error = %e, "storage read failed, using defaults");
                return Loaded {
                    value: default,
                    source: LoadSource::Default,
                    error: Some(PersistenceError::Storage(e)),
                };
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key, bytes = bytes.len(), "collection loaded");
                Loaded {
                    value,
                    source: LoadSource::Stored,
                    error: None,
                }
            }
            Err(e) => {
                let backup = self.keep_corrupt(key, &bytes).await;
                warn!(key, error = %e, backup = ?backup, "stored collection is corrupt, using defaults");
                Loaded {
                    value: default,
                    source: LoadSource::Default,
                    error: Some(PersistenceError::Corrupt {
                        key: key.to_owned(),
                        reason: e.to_string(),
                        backup,
                    }),
                }
            }
        }
    }

    /// Copy undecodable bytes to [`corrupt_backup_key`] so the next save
    /// under `key` does not destroy them. Returns the backup key on success.
    async fn keep_corrupt(&self, key: &str, bytes: &[u8]) -> Option<String> {
        let backup = corrupt_backup_key(key);
        match self.storage.put(&backup, bytes).await {
            Ok(()) => Some(backup),
            Err(e) => {
                warn!(key, error = %e, "failed to back up corrupt collection");
                None
            }
        }
    }

    /// Serialize `value` and write it under `key`, replacing what was there.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Serialize`] if `value` cannot be encoded.
    /// - [`PersistenceError::Storage`] if the write fails (quota, I/O).
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec(value).map_err(|e| PersistenceError::Serialize {
            key: key.to_owned(),
            reason: e.to_string(),
        })?;
        self.storage.put(key, &bytes).await?;
        debug!(key, bytes = bytes.len(), "collection saved");
        Ok(())
    }

    /// The backend this adapter writes to.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter").finish_non_exhaustive()
    }
}
