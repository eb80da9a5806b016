//! `RocksDB` storage backend.
//!
//! Opt-in alternative to redb for hosts that already ship `RocksDB`. Keys are
//! the collection names stored as UTF-8 bytes, so lexicographic iteration
//! order matches the `BTreeMap` order of the memory backend.
//!
//! `RocksDB` is a synchronous C++ library; calls run on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options};

use crate::{StorageBackend, StorageError};

type Db = DBWithThreadMode<MultiThreaded>;

/// A storage backend backed by a `RocksDB` directory.
///
/// # Examples
///
/// ```no_run
/// # use partnerboard_storage::RocksDbBackend;
/// let backend = RocksDbBackend::open("./partnerboard-data").unwrap();
/// ```
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open the database directory at `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the directory cannot be opened,
    /// for example because another process holds its lock.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.into_string(),
        })?;
        tracing::debug!(path = %path.display(), "rocksdb storage opened");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Directory of this database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against the database on the blocking pool. `fail` builds
    /// the error for both a `RocksDB` failure and a panicked task.
    async fn with_db<T, F, Op>(&self, fail: F, op: Op) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: Fn(String) -> StorageError + Clone + Send + 'static,
        Op: FnOnce(&Db, &F) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let in_task = fail.clone();
        tokio::task::spawn_blocking(move || op(&db, &in_task))
            .await
            .map_err(|e| fail(format!("blocking task panicked: {e}")))?
    }
}

#[async_trait::async_trait]
impl StorageBackend for RocksDbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_owned();
        let err_key = key.clone();
        self.with_db(
            move |reason| StorageError::Read {
                key: err_key.clone(),
                reason,
            },
            move |db, fail| db.get(key.as_bytes()).map_err(|e| fail(e.into_string())),
        )
        .await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = key.to_owned();
        let err_key = key.clone();
        let value = value.to_vec();
        self.with_db(
            move |reason| StorageError::Write {
                key: err_key.clone(),
                reason,
            },
            move |db, fail| {
                db.put(key.as_bytes(), &value)
                    .map_err(|e| fail(e.into_string()))
            },
        )
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_owned();
        let err_key = key.clone();
        self.with_db(
            move |reason| StorageError::Delete {
                key: err_key.clone(),
                reason,
            },
            move |db, fail| db.delete(key.as_bytes()).map_err(|e| fail(e.into_string())),
        )
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = prefix.to_owned();
        let err_prefix = prefix.clone();
        self.with_db(
            move |reason| StorageError::List {
                prefix: err_prefix.clone(),
                reason,
            },
            move |db, fail| {
                let mut keys = Vec::new();
                let start = IteratorMode::From(prefix.as_bytes(), Direction::Forward);
                for item in db.iterator(start) {
                    let (raw, _) = item.map_err(|e| fail(e.into_string()))?;
                    if !raw.starts_with(prefix.as_bytes()) {
                        break;
                    }
                    let key = String::from_utf8(raw.into_vec())
                        .map_err(|e| StorageError::InvalidKey {
                            reason: e.to_string(),
                        })?;
                    keys.push(key);
                }
                Ok(keys)
            },
        )
        .await
    }
}
