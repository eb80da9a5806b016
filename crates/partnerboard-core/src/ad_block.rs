//! The five fixed ad slots and their markup snippets.
//!
//! Slots are never added or removed: the set of `(id, position)` pairs is
//! the constant [`DEFAULT_SLOTS`] list, and only `code` changes. An empty
//! `code` means the slot is unset.
//!
//! The collection is persisted in full at `adBlocks` after every change.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{AdBlockError, PersistenceError};
use crate::events::{BoardEvent, Notifier};
use crate::persistence::{AD_BLOCKS_KEY, LoadSource, PersistenceAdapter, Saved};

/// Slot ids and labels in page order.
pub const DEFAULT_SLOTS: [(u32, &str); 5] = [
    (1, "Верхний блок"),
    (2, "Боковой блок 1"),
    (3, "Центральный блок"),
    (4, "Боковой блок 2"),
    (5, "Нижний блок"),
];

/// Number of characters of code shown in a slot preview.
pub const PREVIEW_CHARS: usize = 150;

/// A positioned ad slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdBlock {
    pub id: u32,
    /// Raw markup or script; empty when the slot is unset.
    pub code: String,
    /// Human-readable slot label. Fixed for the life of the slot.
    pub position: String,
}

impl AdBlock {
    /// Whether the slot has code.
    pub fn is_configured(&self) -> bool {
        !self.code.is_empty()
    }

    /// The first [`PREVIEW_CHARS`] characters of the code, with `...`
    /// appended when the code is longer.
    pub fn preview(&self) -> String {
        let mut chars = self.code.chars();
        let mut preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            preview.push_str("...");
        }
        preview
    }
}

/// The five slots with no code, in page order.
#[must_use]
pub fn default_ad_blocks() -> Vec<AdBlock> {
    DEFAULT_SLOTS
        .iter()
        .map(|&(id, position)| AdBlock {
            id,
            code: String::new(),
            position: position.to_owned(),
        })
        .collect()
}

/// Fit a stored list onto the fixed slot set.
///
/// Each default slot takes its code from the first stored entry with the
/// same id and position. Stored entries that match no slot are dropped.
/// Returns the reconciled list and whether it differs from `stored`.
fn reconcile(stored: &[AdBlock]) -> (Vec<AdBlock>, bool) {
    let mut blocks = default_ad_blocks();
    for block in &mut blocks {
        if let Some(found) = stored
            .iter()
            .find(|s| s.id == block.id && s.position == block.position)
        {
            block.code.clone_from(&found.code);
        }
    }
    let changed = blocks.as_slice() != stored;
    (blocks, changed)
}

/// In-memory owner of the ad slots, mirrored to storage on every change.
pub struct AdBlockStore {
    adapter: PersistenceAdapter,
    notifier: Notifier,
    blocks: RwLock<Vec<AdBlock>>,
    load_error: Option<PersistenceError>,
}

impl AdBlockStore {
    /// Load the slots from storage, or seed the defaults.
    ///
    /// A stored list that does not match the fixed slot set is reconciled
    /// and written back. Corrupt or unreadable data falls back to the
    /// defaults; the cause is kept in [`load_error`](Self::load_error).
    pub async fn open(adapter: PersistenceAdapter, notifier: Notifier) -> Self {
        let loaded = adapter.load(AD_BLOCKS_KEY, default_ad_blocks()).await;
        let mut load_error = loaded.error;
        let blocks = match loaded.source {
            LoadSource::Stored => {
                let (blocks, changed) = reconcile(&loaded.value);
                if changed {
                    warn!(
                        stored = loaded.value.len(),
                        "stored ad blocks do not match the fixed slots, reconciling"
                    );
                    if let Err(e) = adapter.save(AD_BLOCKS_KEY, &blocks).await {
                        warn!(error = %e, "failed to write reconciled ad blocks");
                        load_error = Some(e);
                    }
                }
                blocks
            }
            LoadSource::Default => loaded.value,
        };

        Self {
            adapter,
            notifier,
            blocks: RwLock::new(blocks),
            load_error,
        }
    }

    /// Why the stored slots were rejected or could not be rewritten at
    /// open, if they were.
    #[must_use]
    pub fn load_error(&self) -> Option<&PersistenceError> {
        self.load_error.as_ref()
    }

    /// Snapshot of all slots in page order.
    pub async fn list(&self) -> Vec<AdBlock> {
        self.blocks.read().await.clone()
    }

    /// Look up one slot.
    pub async fn get(&self, id: u32) -> Option<AdBlock> {
        self.blocks.read().await.iter().find(|b| b.id == id).cloned()
    }

    /// Replace the code of slot `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AdBlockError::NotFound`] if no slot has this id; nothing is
    /// changed or written in that case.
    pub async fn update_code(
        &self,
        id: u32,
        code: impl Into<String>,
    ) -> Result<Saved<AdBlock>, AdBlockError> {
        let saved = self.set_code(id, code.into()).await?;
        info!(id, position = %saved.value.position, "ad code saved");
        self.notifier.publish(BoardEvent::AdCodeSaved {
            id,
            position: saved.value.position.clone(),
        });
        Ok(saved)
    }

    /// Empty the code of slot `id`. Clearing an empty slot is a no-op
    /// apart from the rewrite.
    ///
    /// # Errors
    ///
    /// Returns [`AdBlockError::NotFound`] if no slot has this id.
    pub async fn clear_code(&self, id: u32) -> Result<Saved<AdBlock>, AdBlockError> {
        let saved = self.set_code(id, String::new()).await?;
        info!(id, position = %saved.value.position, "ad code cleared");
        self.notifier.publish(BoardEvent::AdCodeCleared {
            id,
            position: saved.value.position.clone(),
        });
        Ok(saved)
    }

    async fn set_code(&self, id: u32, code: String) -> Result<Saved<AdBlock>, AdBlockError> {
        let mut blocks = self.blocks.write().await;
        let block = blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(AdBlockError::NotFound { id })?;
        block.code = code;
        let value = block.clone();

        let warning = self.persist(&blocks).await;
        Ok(Saved { value, warning })
    }

    /// Write the full list. Failures are logged and published, not returned
    /// as errors: the in-memory change stands.
    async fn persist(&self, blocks: &[AdBlock]) -> Option<PersistenceError> {
        let err = self.adapter.save(AD_BLOCKS_KEY, blocks).await.err()?;
        warn!(key = AD_BLOCKS_KEY, error = %err, "ad blocks not persisted");
        self.notifier.publish(BoardEvent::PersistFailed {
            key: AD_BLOCKS_KEY.to_owned(),
            reason: err.to_string(),
        });
        Some(err)
    }
}

impl std::fmt::Debug for AdBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdBlockStore").finish_non_exhaustive()
    }
}
