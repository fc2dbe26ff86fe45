use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::{
    db::{KeyValueStore, StorageKey},
    error::AppResult,
    models::ThemeMode,
};

/// Single owner of the process-wide display mode
///
/// The published marker is the only channel observers read. A toggle
/// persists the new mode and then publishes it while holding the toggle
/// lock, so the marker and the persisted value never disagree at any point
/// a [`ThemeSignal::snapshot`] can observe. If persisting fails, nothing is
/// published.
pub struct ThemeSignal {
    store: Arc<dyn KeyValueStore>,
    marker: watch::Sender<ThemeMode>,
    toggle_lock: Mutex<()>,
}

/// Consistent view of the marker and the persisted value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeSnapshot {
    pub marker: ThemeMode,
    pub persisted: Option<ThemeMode>,
}

impl ThemeSnapshot {
    pub fn is_consistent(&self) -> bool {
        self.persisted == Some(self.marker)
    }
}

impl ThemeSignal {
    /// Restores the persisted mode, falling back to dark
    ///
    /// A missing or unreadable value is replaced by the default so the
    /// persisted value and the marker agree from the start.
    pub async fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let persisted = match store.get(StorageKey::Theme).await {
            Ok(Some(raw)) => match raw.parse::<ThemeMode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "Ignoring persisted theme");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted theme");
                None
            }
        };

        let mode = match persisted {
            Some(mode) => mode,
            None => {
                let mode = ThemeMode::default();
                if let Err(e) = store.set(StorageKey::Theme, mode.to_string()).await {
                    tracing::warn!(error = %e, "Failed to persist default theme");
                }
                mode
            }
        };

        tracing::debug!(theme = %mode, "Theme restored");

        let (marker, _) = watch::channel(mode);
        Self {
            store,
            marker,
            toggle_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> ThemeMode {
        *self.marker.borrow()
    }

    /// Flips the mode, persists it, and publishes it as one step
    pub async fn toggle(&self) -> AppResult<ThemeMode> {
        let _guard = self.toggle_lock.lock().await;

        let next = self.current().toggled();
        self.store.set(StorageKey::Theme, next.to_string()).await?;
        self.marker.send_replace(next);

        tracing::info!(theme = %next, observers = self.observer_count(), "Theme toggled");
        Ok(next)
    }

    /// Reads the marker and the persisted value without racing a toggle
    pub async fn snapshot(&self) -> AppResult<ThemeSnapshot> {
        let _guard = self.toggle_lock.lock().await;

        let persisted = self
            .store
            .get(StorageKey::Theme)
            .await?
            .and_then(|raw| raw.parse::<ThemeMode>().ok());

        Ok(ThemeSnapshot {
            marker: self.current(),
            persisted,
        })
    }

    /// Attaches an observer; dropping or detaching the subscription releases it
    pub fn subscribe(&self) -> ThemeSubscription {
        ThemeSubscription {
            receiver: self.marker.subscribe(),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.marker.receiver_count()
    }
}

/// One observer's attachment to the theme marker
///
/// Observers derive presentation from [`ThemeSubscription::current`] each
/// time they render rather than caching a copy.
pub struct ThemeSubscription {
    receiver: watch::Receiver<ThemeMode>,
}

impl ThemeSubscription {
    pub fn current(&self) -> ThemeMode {
        *self.receiver.borrow()
    }

    /// Waits for the next published mode
    ///
    /// Returns `None` once the owning signal is gone.
    pub async fn changed(&mut self) -> Option<ThemeMode> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    pub fn detach(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockKeyValueStore;
    use crate::db::MemoryStore;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_restore_defaults_to_dark_and_persists_it() {
        let store = Arc::new(MemoryStore::new());
        let theme = ThemeSignal::restore(store.clone()).await;

        assert_eq!(theme.current(), ThemeMode::Dark);
        assert_eq!(
            store.get(StorageKey::Theme).await.unwrap(),
            Some("dark".to_string())
        );
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_mode() {
        let store = Arc::new(MemoryStore::with_entries([(
            StorageKey::Theme,
            "light".to_string(),
        )]));
        let theme = ThemeSignal::restore(store).await;
        assert_eq!(theme.current(), ThemeMode::Light);
    }

    #[tokio::test]
    async fn test_restore_replaces_garbage() {
        let store = Arc::new(MemoryStore::with_entries([(
            StorageKey::Theme,
            "sepia".to_string(),
        )]));
        let theme = ThemeSignal::restore(store).await;
        assert_eq!(theme.current(), ThemeMode::Dark);
        assert!(theme.snapshot().await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_double_toggle_returns_to_original_and_stays_consistent() {
        let theme = ThemeSignal::restore(Arc::new(MemoryStore::new())).await;
        let original = theme.current();
        assert!(theme.snapshot().await.unwrap().is_consistent());

        let first = theme.toggle().await.unwrap();
        assert_eq!(first, original.toggled());
        let snapshot = theme.snapshot().await.unwrap();
        assert!(snapshot.is_consistent());
        assert_eq!(snapshot.marker, first);

        let second = theme.toggle().await.unwrap();
        assert_eq!(second, original);
        assert!(theme.snapshot().await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_observers_are_notified() {
        let theme = ThemeSignal::restore(Arc::new(MemoryStore::new())).await;
        let mut header = theme.subscribe();
        let mut card = theme.subscribe();
        assert_eq!(theme.observer_count(), 2);

        theme.toggle().await.unwrap();
        assert_eq!(header.changed().await, Some(ThemeMode::Light));
        assert_eq!(card.changed().await, Some(ThemeMode::Light));
        assert_eq!(card.current(), ThemeMode::Light);

        card.detach();
        assert_eq!(theme.observer_count(), 1);
    }

    #[tokio::test]
    async fn test_changed_ends_when_signal_dropped() {
        let theme = ThemeSignal::restore(Arc::new(MemoryStore::new())).await;
        let mut observer = theme.subscribe();
        drop(theme);
        assert_eq!(observer.changed().await, None);
    }

    #[tokio::test]
    async fn test_failed_persist_publishes_nothing() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some("dark".to_string())));
        store
            .expect_set()
            .returning(|_, _| Err(AppError::Storage("disk full".to_string())));

        let theme = ThemeSignal::restore(Arc::new(store)).await;
        let observer = theme.subscribe();

        assert!(theme.toggle().await.is_err());
        assert_eq!(theme.current(), ThemeMode::Dark);
        assert_eq!(observer.current(), ThemeMode::Dark);
        let snapshot = theme.snapshot().await.unwrap();
        assert!(snapshot.is_consistent());
    }
}
