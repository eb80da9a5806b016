//! Partner website cards: create, partial update, delete.
//!
//! Ids are assigned as one more than the largest id present, so a fresh
//! collection starts at 1 and ids of deleted cards at the end of the range
//! can be handed out again. The list keeps insertion order.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{PersistenceError, WebsiteError};
use crate::events::{BoardEvent, Notifier};
use crate::persistence::{PersistenceAdapter, Saved, WEBSITES_KEY};

/// A partner website card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub id: u32,
    pub title: String,
    pub url: String,
    pub description: String,
    pub image: String,
}

/// Fields for a new card. The id is assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWebsite {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// A partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsitePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl WebsitePatch {
    /// Patch that only sets the title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.image.is_none()
    }

    /// Build the patched copy of `site` without touching the original.
    fn merged(&self, site: &Website) -> Website {
        Website {
            id: site.id,
            title: self.title.clone().unwrap_or_else(|| site.title.clone()),
            url: self.url.clone().unwrap_or_else(|| site.url.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| site.description.clone()),
            image: self.image.clone().unwrap_or_else(|| site.image.clone()),
        }
    }
}

/// The two cards a fresh board starts with.
#[must_use]
pub fn default_websites() -> Vec<Website> {
    vec![
        Website {
            id: 1,
            title: "Яндекс Дистрибуция".to_owned(),
            url: "https://distribution.yandex.ru".to_owned(),
            description: "Партнерская программа Яндекса для владельцев сайтов и приложений"
                .to_owned(),
            image: "/img/partners/yandex.svg".to_owned(),
        },
        Website {
            id: 2,
            title: "Admitad".to_owned(),
            url: "https://www.admitad.com".to_owned(),
            description: "CPA-сеть с тысячами офферов для вебмастеров".to_owned(),
            image: "/img/partners/admitad.svg".to_owned(),
        },
    ]
}

/// Title and url must be present; nothing else is checked.
fn require(field: &'static str, value: &str) -> Result<(), WebsiteError> {
    if value.trim().is_empty() {
        return Err(WebsiteError::MissingField { field });
    }
    Ok(())
}

/// In-memory owner of the partner website list, mirrored to storage on
/// every change.
pub struct WebsiteStore {
    adapter: PersistenceAdapter,
    notifier: Notifier,
    sites: RwLock<Vec<Website>>,
    load_error: Option<PersistenceError>,
}

impl WebsiteStore {
    /// Load the list from storage, or seed the two default cards.
    ///
    /// Corrupt or unreadable data falls back to the defaults. The cause is
    /// kept and available from [`load_error`](Self::load_error).
    pub async fn open(adapter: PersistenceAdapter, notifier: Notifier) -> Self {
        let loaded = adapter.load(WEBSITES_KEY, default_websites()).await;
        Self {
            adapter,
            notifier,
            sites: RwLock::new(loaded.value),
            load_error: loaded.error,
        }
    }

    /// Why the stored list was rejected at open, if it was.
    #[must_use]
    pub fn load_error(&self) -> Option<&PersistenceError> {
        self.load_error.as_ref()
    }

    /// Snapshot of all cards in list order.
    pub async fn list(&self) -> Vec<Website> {
        self.sites.read().await.clone()
    }

    /// Look up one card.
    pub async fn get(&self, id: u32) -> Option<Website> {
        self.sites.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Append a new card with the next free id.
    ///
    /// # Errors
    ///
    /// - [`WebsiteError::MissingField`] if `title` or `url` is blank.
    /// - [`WebsiteError::IdsExhausted`] if the largest id is `u32::MAX`.
    pub async fn create(&self, fields: NewWebsite) -> Result<Saved<Website>, WebsiteError> {
        require("title", &fields.title)?;
        require("url", &fields.url)?;

        let mut sites = self.sites.write().await;
        let id = sites
            .iter()
            .map(|s| s.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(WebsiteError::IdsExhausted)?;

        let site = Website {
            id,
            title: fields.title,
            url: fields.url,
            description: fields.description,
            image: fields.image,
        };
        sites.push(site.clone());
        let warning = self.persist(&sites).await;
        drop(sites);

        info!(id, title = %site.title, "website created");
        self.notifier.publish(BoardEvent::WebsiteCreated {
            id,
            title: site.title.clone(),
        });
        Ok(Saved {
            value: site,
            warning,
        })
    }

    /// Merge `patch` into card `id`.
    ///
    /// # Errors
    ///
    /// - [`WebsiteError::NotFound`] if no card has this id.
    /// - [`WebsiteError::MissingField`] if the patch blanks `title` or `url`.
    pub async fn update(
        &self,
        id: u32,
        patch: WebsitePatch,
    ) -> Result<Saved<Website>, WebsiteError> {
        if let Some(title) = &patch.title {
            require("title", title)?;
        }
        if let Some(url) = &patch.url {
            require("url", url)?;
        }

        let mut sites = self.sites.write().await;
        let slot = sites
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(WebsiteError::NotFound { id })?;
        let site = patch.merged(slot);
        *slot = site.clone();
        let warning = self.persist(&sites).await;
        drop(sites);

        info!(id, title = %site.title, "website updated");
        self.notifier.publish(BoardEvent::WebsiteUpdated {
            id,
            title: site.title.clone(),
        });
        Ok(Saved {
            value: site,
            warning,
        })
    }

    /// Remove card `id` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`WebsiteError::NotFound`] if no card has this id; the list
    /// is left as it was.
    pub async fn delete(&self, id: u32) -> Result<Saved<Website>, WebsiteError> {
        let mut sites = self.sites.write().await;
        let index = sites
            .iter()
            .position(|s| s.id == id)
            .ok_or(WebsiteError::NotFound { id })?;
        let site = sites.remove(index);
        let warning = self.persist(&sites).await;
        drop(sites);

        info!(id, title = %site.title, "website deleted");
        self.notifier.publish(BoardEvent::WebsiteDeleted {
            id,
            title: site.title.clone(),
        });
        Ok(Saved {
            value: site,
            warning,
        })
    }

    async fn persist(&self, sites: &[Website]) -> Option<PersistenceError> {
        let err = self.adapter.save(WEBSITES_KEY, sites).await.err()?;
        warn!(key = WEBSITES_KEY, error = %err, "websites not persisted");
        self.notifier.publish(BoardEvent::PersistFailed {
            key: WEBSITES_KEY.to_owned(),
            reason: err.to_string(),
        });
        Some(err)
    }
}

impl std::fmt::Debug for WebsiteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebsiteStore").finish_non_exhaustive()
    }
}
