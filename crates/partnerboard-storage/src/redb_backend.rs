//! Single-file redb storage backend — the default durable store.
//!
//! The closest native analogue to browser local storage: one file on disk,
//! pure Rust, no server. Every `put` and `delete` runs in its own write
//! transaction, so a crash never leaves a half-written value behind.
//!
//! redb is synchronous; calls are moved onto the Tokio blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, TableDefinition};

use crate::{StorageBackend, StorageError};

/// All collections share one table; keys are the collection names.
const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// A storage backend backed by a redb database file.
///
/// # Examples
///
/// ```no_run
/// # use partnerboard_storage::RedbBackend;
/// let backend = RedbBackend::open("./partnerboard.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be opened or created,
    /// or [`StorageError::Transaction`] if the entries table cannot be set up.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Opening the table in a write txn creates it if missing, so readers
        // never see a missing table on a fresh file.
        let txn = db.begin_write().map_err(transaction_error)?;
        txn.open_table(ENTRIES).map_err(missing_table)?;
        txn.commit().map_err(transaction_error)?;

        tracing::debug!(path = %path.display(), "redb storage opened");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Return the filesystem path of this database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a blocking closure against the database on the blocking pool.
    async fn with_db<T, F, Op>(&self, on_panic: F, op: Op) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(String) -> StorageError,
        Op: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| on_panic(format!("blocking task panicked: {e}")))?
    }
}

fn transaction_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

fn missing_table(e: impl std::fmt::Display) -> StorageError {
    StorageError::MissingTable {
        name: format!("entries: {e}"),
    }
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_owned();
        let err_key = key.clone();
        self.with_db(
            |reason| StorageError::Read { key: err_key, reason },
            move |db| {
                let txn = db.begin_read().map_err(transaction_error)?;
                let table = txn.open_table(ENTRIES).map_err(missing_table)?;
                let value = table
                    .get(key.as_str())
                    .map_err(|e| StorageError::Read {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?
                    .map(|v| v.value().to_vec());
                Ok(value)
            },
        )
        .await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = key.to_owned();
        let err_key = key.clone();
        let value = value.to_vec();
        self.with_db(
            |reason| StorageError::Write { key: err_key, reason },
            move |db| {
                let txn = db.begin_write().map_err(transaction_error)?;
                {
                    let mut table = txn.open_table(ENTRIES).map_err(missing_table)?;
                    table
                        .insert(key.as_str(), value.as_slice())
                        .map_err(|e| StorageError::Write {
                            key: key.clone(),
                            reason: e.to_string(),
                        })?;
                }
                txn.commit().map_err(|e| StorageError::Write {
                    key,
                    reason: e.to_string(),
                })
            },
        )
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_owned();
        let err_key = key.clone();
        self.with_db(
            |reason| StorageError::Delete { key: err_key, reason },
            move |db| {
                let txn = db.begin_write().map_err(transaction_error)?;
                {
                    let mut table = txn.open_table(ENTRIES).map_err(missing_table)?;
                    table
                        .remove(key.as_str())
                        .map_err(|e| StorageError::Delete {
                            key: key.clone(),
                            reason: e.to_string(),
                        })?;
                }
                txn.commit().map_err(|e| StorageError::Delete {
                    key,
                    reason: e.to_string(),
                })
            },
        )
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = prefix.to_owned();
        let err_prefix = prefix.clone();
        self.with_db(
            |reason| StorageError::List {
                prefix: err_prefix,
                reason,
            },
            move |db| {
                let list_error = |e: redb::StorageError| StorageError::List {
                    prefix: prefix.clone(),
                    reason: e.to_string(),
                };
                let txn = db.begin_read().map_err(transaction_error)?;
                let table = txn.open_table(ENTRIES).map_err(missing_table)?;

                let mut keys = Vec::new();
                for item in table.range(prefix.as_str()..).map_err(list_error)? {
                    let (k, _) = item.map_err(list_error)?;
                    let key = k.value();
                    if !key.starts_with(prefix.as_str()) {
                        break;
                    }
                    keys.push(key.to_owned());
                }
                Ok(keys)
            },
        )
        .await
    }
}
