//! Change notifications for the presentation layer.
//!
//! Stores publish a [`BoardEvent`] after every mutation, once the durable
//! write has been attempted. Subscribers re-render from a fresh snapshot and
//! can show the event's [`Notice`] to the user.

use tokio::sync::broadcast;

/// Something that changed on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// An ad slot received new code.
    AdCodeSaved { id: u32, position: String },
    /// An ad slot was emptied.
    AdCodeCleared { id: u32, position: String },
    /// A partner website was added.
    WebsiteCreated { id: u32, title: String },
    /// A partner website was edited.
    WebsiteUpdated { id: u32, title: String },
    /// A partner website was removed.
    WebsiteDeleted { id: u32, title: String },
    /// A mutation was applied in memory but could not be written to storage.
    PersistFailed { key: String, reason: String },
}

/// A short user-facing message: a title and one line of detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(title: &str, description: String) -> Self {
        Self {
            title: title.to_owned(),
            description,
        }
    }
}

impl BoardEvent {
    /// The message the landing page shows for this event.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::AdCodeSaved { position, .. } => Notice::new(
                "Код сохранен",
                format!("Рекламный код для \"{position}\" успешно обновлен"),
            ),
            Self::AdCodeCleared { .. } => {
                Notice::new("Код удален", "Рекламный блок очищен".to_owned())
            }
            Self::WebsiteCreated { title, .. } => {
                Notice::new("Сайт добавлен", format!("\"{title}\" добавлен в список партнеров"))
            }
            Self::WebsiteUpdated { title, .. } => {
                Notice::new("Сайт обновлен", format!("Данные \"{title}\" сохранены"))
            }
            Self::WebsiteDeleted { title, .. } => {
                Notice::new("Сайт удален", format!("\"{title}\" удален из списка партнеров"))
            }
            Self::PersistFailed { reason, .. } => Notice::new(
                "Изменения не сохранены",
                format!("Изменения действуют до перезагрузки, но не записаны в хранилище: {reason}"),
            ),
        }
    }

    /// Whether this event reports a problem rather than a completed change.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::PersistFailed { .. })
    }
}

/// Broadcast sender shared by both stores. Clones publish to the same channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<BoardEvent>,
}

impl Notifier {
    /// Create a channel that buffers up to `capacity` unread events per
    /// subscriber. Slow subscribers see `RecvError::Lagged` past that.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, event: BoardEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
