//! The board: both stores wired to one backend and one event channel.
//!
//! Callers hold a [`Board`] (or the stores it lends out) explicitly; there is
//! no global instance.

use std::sync::Arc;

use partnerboard_storage::{MemoryBackend, StorageBackend};
use tokio::sync::broadcast;
use tracing::info;

use crate::ad_block::AdBlockStore;
use crate::config::{BoardConfig, StorageKind};
use crate::error::{BoardError, PersistenceError};
use crate::events::{BoardEvent, Notifier};
use crate::persistence::{AD_BLOCKS_KEY, PersistenceAdapter, WEBSITES_KEY};
use crate::website::WebsiteStore;

/// Ad slots and partner websites over a shared storage backend.
pub struct Board {
    ad_blocks: AdBlockStore,
    websites: WebsiteStore,
    notifier: Notifier,
    adapter: PersistenceAdapter,
}

impl Board {
    /// Open the configured storage backend and load both collections.
    ///
    /// # Errors
    ///
    /// - [`BoardError::Storage`] if the backend cannot be opened.
    /// - [`BoardError::BackendUnavailable`] if the backend was compiled out.
    pub async fn open(config: &BoardConfig) -> Result<Self, BoardError> {
        let storage = open_storage(&config.storage)?;
        info!(storage = ?config.storage, "board storage ready");
        Ok(Self::with_storage(storage, config.event_capacity).await)
    }

    /// Load both collections from an already-open backend.
    pub async fn with_storage(storage: Arc<dyn StorageBackend>, event_capacity: usize) -> Self {
        let adapter = PersistenceAdapter::new(storage);
        let notifier = Notifier::new(event_capacity);
        let ad_blocks = AdBlockStore::open(adapter.clone(), notifier.clone()).await;
        let websites = WebsiteStore::open(adapter.clone(), notifier.clone()).await;
        Self {
            ad_blocks,
            websites,
            notifier,
            adapter,
        }
    }

    /// The ad slots.
    #[must_use]
    pub fn ad_blocks(&self) -> &AdBlockStore {
        &self.ad_blocks
    }

    /// The partner websites.
    #[must_use]
    pub fn websites(&self) -> &WebsiteStore {
        &self.websites
    }

    /// Receive every event either store publishes from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.notifier.subscribe()
    }

    /// Problems met while loading either collection, keyed by storage key.
    ///
    /// A store with an entry here started from its defaults (or could not
    /// write back its reconciled list).
    #[must_use]
    pub fn load_errors(&self) -> Vec<(&'static str, &PersistenceError)> {
        [
            (AD_BLOCKS_KEY, self.ad_blocks.load_error()),
            (WEBSITES_KEY, self.websites.load_error()),
        ]
        .into_iter()
        .filter_map(|(key, err)| err.map(|e| (key, e)))
        .collect()
    }

    /// The storage backend behind both stores.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        self.adapter.storage()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board").finish_non_exhaustive()
    }
}

/// Build the backend named by `kind`.
///
/// # Errors
///
/// - [`BoardError::Storage`] if the backend cannot be opened.
/// - [`BoardError::BackendUnavailable`] if the backend was compiled out.
pub fn open_storage(kind: &StorageKind) -> Result<Arc<dyn StorageBackend>, BoardError> {
    match kind {
        StorageKind::Memory => Ok(Arc::new(MemoryBackend::new())),
        #[cfg(feature = "redb-backend")]
        StorageKind::Redb { path } => Ok(Arc::new(partnerboard_storage::RedbBackend::open(
            path,
        )?)),
        #[cfg(not(feature = "redb-backend"))]
        StorageKind::Redb { .. } => Err(BoardError::BackendUnavailable {
            name: "redb",
            feature: "redb-backend",
        }),
        #[cfg(feature = "rocksdb-backend")]
        StorageKind::RocksDb { path } => Ok(Arc::new(
            partnerboard_storage::RocksDbBackend::open(path)?,
        )),
        #[cfg(not(feature = "rocksdb-backend"))]
        StorageKind::RocksDb { .. } => Err(BoardError::BackendUnavailable {
            name: "rocksdb",
            feature: "rocksdb-backend",
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::persistence::corrupt_backup_key;
    use crate::testing::memory_with;
    use crate::website::NewWebsite;

    #[tokio::test]
    async fn stores_share_one_backend_with_separate_keys() {
        let storage = MemoryBackend::new();
        let board = Board::with_storage(Arc::new(storage.clone()), 8).await;

        board.ad_blocks().update_code(1, "<a/>").await.unwrap();
        board.websites().delete(1).await.unwrap();

        let keys = storage.list("").await.unwrap();
        assert_eq!(keys, vec![AD_BLOCKS_KEY, WEBSITES_KEY]);
    }

    #[tokio::test]
    async fn subscriber_sees_events_from_both_stores() {
        let board = Board::with_storage(Arc::new(MemoryBackend::new()), 8).await;
        let mut rx = board.subscribe();

        board.ad_blocks().clear_code(2).await.unwrap();
        let created = board
            .websites()
            .create(NewWebsite {
                title: "Site3".to_owned(),
                url: "http://x".to_owned(),
                ..NewWebsite::default()
            })
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            BoardEvent::AdCodeCleared { id: 2, .. }
        ));
        assert_eq!(
            rx.recv().await.unwrap(),
            BoardEvent::WebsiteCreated {
                id: created.value.id,
                title: "Site3".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn load_errors_name_the_rejected_collection() {
        let storage = memory_with(WEBSITES_KEY, b"[{\"id\":1}]").await;
        let board = Board::with_storage(Arc::new(storage.clone()), 8).await;

        let errors = board.load_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, WEBSITES_KEY);
        assert!(matches!(errors[0].1, PersistenceError::Corrupt { .. }));
        assert!(storage.exists(&corrupt_backup_key(WEBSITES_KEY)).await.unwrap());
    }

    #[tokio::test]
    async fn fresh_board_has_no_load_errors() {
        let board = Board::with_storage(Arc::new(MemoryBackend::new()), 8).await;
        assert!(board.load_errors().is_empty());
    }

    #[tokio::test]
    async fn memory_config_opens_fresh_defaults() {
        let config = BoardConfig {
            storage: StorageKind::Memory,
            ..BoardConfig::default()
        };
        let board = Board::open(&config).await.unwrap();
        assert_eq!(board.ad_blocks().list().await.len(), 5);
        assert_eq!(board.websites().list().await.len(), 2);
        assert!(!board.storage().exists(AD_BLOCKS_KEY).await.unwrap());
    }

    #[cfg(feature = "redb-backend")]
    #[tokio::test]
    async fn redb_board_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = BoardConfig {
            storage: StorageKind::Redb {
                path: dir.path().join("board.redb"),
            },
            ..BoardConfig::default()
        };

        {
            let board = Board::open(&config).await.unwrap();
            board.ad_blocks().update_code(3, "<script>A</script>").await.unwrap();
            board.websites().delete(1).await.unwrap();
        }

        let board = Board::open(&config).await.unwrap();
        assert_eq!(board.ad_blocks().get(3).await.unwrap().code, "<script>A</script>");
        let sites = board.websites().list().await;
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, 2);
    }
}
