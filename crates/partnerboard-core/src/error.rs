//! Error types for `partnerboard-core`.
//!
//! Lookups that miss are ordinary results, not failures of the store, so
//! `NotFound` lives in the per-collection enums. Persistence problems get
//! their own type because they are reported next to a successful mutation
//! rather than instead of it.

use partnerboard_storage::StorageError;

/// Errors from reading or writing a collection in durable storage.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Stored bytes under `key` are not a valid collection. The bytes are
    /// copied to `backup` when that write succeeds.
    #[error("stored value for '{key}' is corrupt: {reason}{}", backup_note(.backup.as_deref()))]
    Corrupt {
        key: String,
        reason: String,
        backup: Option<String>,
    },

    /// The collection could not be serialized.
    #[error("failed to serialize '{key}': {reason}")]
    Serialize { key: String, reason: String },
}

fn backup_note(backup: Option<&str>) -> String {
    backup.map_or_else(String::new, |b| format!(" (original kept under '{b}')"))
}

/// Errors from ad block operations.
#[derive(Debug, thiserror::Error)]
pub enum AdBlockError {
    /// No slot has this id. The five slots are fixed; nothing was changed.
    #[error("ad block not found: {id}")]
    NotFound { id: u32 },
}

/// Errors from partner website operations.
#[derive(Debug, thiserror::Error)]
pub enum WebsiteError {
    /// No website has this id; nothing was changed.
    #[error("website not found: {id}")]
    NotFound { id: u32 },

    /// A required field was empty or whitespace.
    #[error("website {field} must not be empty")]
    MissingField { field: &'static str },

    /// The highest id is already `u32::MAX`, so no fresh id exists.
    #[error("website id space exhausted")]
    IdsExhausted,
}

/// Errors from opening a [`Board`](crate::board::Board).
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The configured storage backend could not be opened.
    #[error("board storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configured backend was not compiled into this build.
    #[error("storage backend '{name}' is not available in this build (enable the '{feature}' feature)")]
    BackendUnavailable {
        name: &'static str,
        feature: &'static str,
    },
}
