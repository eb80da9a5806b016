//! Board configuration.
//!
//! Loaded from `PARTNERBOARD_*` environment variables with sensible
//! defaults. The CLI layers its flags on top.

use std::path::PathBuf;

/// Default redb database file.
pub const DEFAULT_REDB_PATH: &str = "./partnerboard.redb";

/// Default `RocksDB` directory.
pub const DEFAULT_ROCKSDB_PATH: &str = "./partnerboard-data";

/// Default broadcast buffer for change events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Which storage backend holds the collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// In-memory (nothing survives the process).
    Memory,
    /// Single-file redb database.
    Redb { path: PathBuf },
    /// `RocksDB` directory.
    RocksDb { path: PathBuf },
}

impl StorageKind {
    /// Resolve a backend name and optional path. Unknown names select redb.
    #[must_use]
    pub fn parse(name: &str, path: Option<PathBuf>) -> Self {
        match name.to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            "rocksdb" | "rocks" => Self::RocksDb {
                path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_ROCKSDB_PATH)),
            },
            _ => Self::Redb {
                path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_REDB_PATH)),
            },
        }
    }
}

impl Default for StorageKind {
    fn default() -> Self {
        Self::Redb {
            path: PathBuf::from(DEFAULT_REDB_PATH),
        }
    }
}

/// Board configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Storage backend for both collections.
    pub storage: StorageKind,
    /// Log filter (e.g. `warn`, `info`, `partnerboard_core=debug`).
    pub log_level: String,
    /// Unread events buffered per subscriber.
    pub event_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::default(),
            log_level: "warn".to_owned(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl BoardConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PARTNERBOARD_STORAGE` — `memory`, `redb`, or `rocksdb` (default: `redb`)
    /// - `PARTNERBOARD_STORAGE_PATH` — database file or directory
    ///   (default: `./partnerboard.redb`, or `./partnerboard-data` for rocksdb)
    /// - `PARTNERBOARD_LOG_LEVEL` — log filter (default: `warn`)
    /// - `PARTNERBOARD_EVENT_CAPACITY` — event buffer size (default: `64`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let path = var("PARTNERBOARD_STORAGE_PATH").map(PathBuf::from);
        let storage = StorageKind::parse(
            &var("PARTNERBOARD_STORAGE").unwrap_or_else(|| "redb".to_owned()),
            path,
        );

        let log_level = var("PARTNERBOARD_LOG_LEVEL").unwrap_or_else(|| "warn".to_owned());

        let event_capacity = var("PARTNERBOARD_EVENT_CAPACITY")
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_EVENT_CAPACITY);

        Self {
            storage,
            log_level,
            event_capacity,
        }
    }
}
