use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, TitleKey, WatchStatus},
    notify::Notifications,
    services::RecommendationService,
    session::SessionStore,
};

/// Two-phase membership value
///
/// `confirmed` is the last value the server agreed with. `pending` holds the
/// optimistic target while an add/remove is in flight. Settling collapses it
/// back to a single confirmed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipFlag {
    pub confirmed: bool,
    pub pending: Option<bool>,
}

impl MembershipFlag {
    /// Value shown to the user
    pub fn value(self) -> bool {
        self.pending.unwrap_or(self.confirmed)
    }

    pub fn is_pending(self) -> bool {
        self.pending.is_some()
    }

    pub fn begin_toggle(self) -> Self {
        Self {
            confirmed: self.confirmed,
            pending: Some(!self.value()),
        }
    }

    pub fn settle_success(self) -> Self {
        Self {
            confirmed: self.value(),
            pending: None,
        }
    }

    pub fn settle_failure(self) -> Self {
        Self {
            confirmed: self.confirmed,
            pending: None,
        }
    }

    /// Records what the server reported without disturbing an in-flight toggle
    pub fn reconcile(self, on_server: bool) -> Self {
        Self {
            confirmed: on_server,
            pending: self.pending,
        }
    }
}

type FlagKey = (String, TitleKey);

/// Per-user, per-title cache of "is this movie on my watchlist"
///
/// Flags are keyed by username, so a different login never sees another
/// user's cached answers. There is no cross-tab coordination: if another
/// client changes the list, the server applies last-write-wins and this
/// cache catches up on the next [`MembershipCache::check`].
pub struct MembershipCache {
    remote: Arc<dyn RecommendationService>,
    session: Arc<SessionStore>,
    notifications: Arc<Notifications>,
    flags: Mutex<HashMap<FlagKey, MembershipFlag>>,
}

impl MembershipCache {
    pub fn new(
        remote: Arc<dyn RecommendationService>,
        session: Arc<SessionStore>,
        notifications: Arc<Notifications>,
    ) -> Self {
        Self {
            remote,
            session,
            notifications,
            flags: Mutex::new(HashMap::new()),
        }
    }

    /// Current cached value without touching the network
    pub async fn flag(&self, movie: &Movie) -> bool {
        self.state(movie).await.value()
    }

    /// True while a toggle for this movie awaits the server
    pub async fn is_in_flight(&self, movie: &Movie) -> bool {
        self.state(movie).await.is_pending()
    }

    async fn state(&self, movie: &Movie) -> MembershipFlag {
        let Some(identity) = self.session.current() else {
            return MembershipFlag::default();
        };
        self.flags
            .lock()
            .await
            .get(&(identity.username, movie.key()))
            .copied()
            .unwrap_or_default()
    }

    /// Reconciles the flag against the user's remote watchlist
    ///
    /// Never fails: on any error the previous value (default `false`) is kept.
    pub async fn check(&self, movie: &Movie) -> bool {
        let Some(identity) = self.session.current() else {
            return false;
        };
        let key = (identity.username.clone(), movie.key());

        let result = self.remote.fetch_watchlist(&identity.username).await;
        let result = self.session.guard(result).await;

        let mut flags = self.flags.lock().await;
        let flag = flags.entry(key).or_default();

        match result {
            Ok(response) => {
                let on_server = response.watchlist.iter().any(|e| e.key() == movie.key());
                *flag = flag.reconcile(on_server);
                tracing::debug!(title = %movie.title, on_server, "Membership checked");
            }
            Err(e) => {
                tracing::warn!(title = %movie.title, error = %e, "Membership check failed, keeping cached value");
            }
        }

        flag.value()
    }

    /// Flips membership optimistically, then confirms with the server
    ///
    /// The new value is visible immediately. On failure it is rolled back to
    /// the pre-toggle value and `AppError::Sync` is returned; nothing is
    /// retried. A second toggle for the same movie while one is in flight is
    /// refused with `AppError::InFlight`.
    pub async fn toggle(&self, movie: &Movie) -> AppResult<bool> {
        let identity = self.session.require_identity()?;
        let key = (identity.username.clone(), movie.key());

        let target = {
            let mut flags = self.flags.lock().await;
            let flag = flags.entry(key.clone()).or_default();
            if flag.is_pending() {
                return Err(AppError::InFlight(format!(
                    "Watchlist update for '{}' already in progress",
                    movie.title
                )));
            }
            *flag = flag.begin_toggle();
            flag.value()
        };

        let result = if target {
            self.remote
                .add_entry(
                    &identity.username,
                    movie.to_new_entry(WatchStatus::default(), None),
                )
                .await
        } else {
            self.remote
                .remove_entry(&identity.username, &movie.title)
                .await
        };
        let result = self.session.guard(result).await;

        {
            let mut flags = self.flags.lock().await;
            let flag = flags.entry(key).or_default();
            *flag = match &result {
                Ok(()) => flag.settle_success(),
                Err(_) => flag.settle_failure(),
            };
        }

        match result {
            Ok(()) => {
                let message = if target {
                    "Added to Watchlist"
                } else {
                    "Removed from Watchlist"
                };
                self.notifications.success(message).await;
                tracing::info!(username = %identity, title = %movie.title, in_watchlist = target, "Membership toggled");
                Ok(target)
            }
            Err(e) => {
                tracing::warn!(
                    username = %identity,
                    title = %movie.title,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Membership toggle rolled back"
                );
                self.notifications.error("Failed to update watchlist").await;
                Err(AppError::Sync(e.user_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{KeyValueStore, MemoryStore, StorageKey};
    use crate::models::wire::WatchlistResponse;
    use crate::models::{WatchlistEntry, WatchlistStats};
    use crate::notify::NotificationKind;
    use crate::services::providers::MockRecommendationService;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio_test::assert_ok;

    fn listing(titles: &[&str]) -> WatchlistResponse {
        let watchlist: Vec<WatchlistEntry> = titles
            .iter()
            .map(|t| WatchlistEntry {
                title: t.to_string(),
                poster_path: None,
                genres: None,
                overview: None,
                status: WatchStatus::PlanToWatch,
                rating: None,
            })
            .collect();
        WatchlistResponse {
            user: None,
            stats: WatchlistStats::from_entries(&watchlist),
            watchlist,
        }
    }

    async fn logged_in(
        remote: MockRecommendationService,
    ) -> (MembershipCache, Arc<SessionStore>, Arc<Notifications>) {
        let remote: Arc<dyn RecommendationService> = Arc::new(remote);
        let store = Arc::new(MemoryStore::new());
        store
            .set(StorageKey::User, "ada".to_string())
            .await
            .unwrap();
        let session = Arc::new(SessionStore::new(remote.clone(), store));
        session.restore_on_startup().await;
        let notifications = Arc::new(Notifications::new());
        let cache = MembershipCache::new(remote, session.clone(), notifications.clone());
        (cache, session, notifications)
    }

    #[test]
    fn test_flag_two_phase_transitions() {
        let flag = MembershipFlag::default();
        let pending = flag.begin_toggle();
        assert!(pending.value());
        assert!(!pending.confirmed);

        assert_eq!(pending.settle_failure(), flag);
        assert_eq!(
            pending.settle_success(),
            MembershipFlag {
                confirmed: true,
                pending: None
            }
        );
    }

    #[test]
    fn test_reconcile_preserves_pending_target() {
        let flag = MembershipFlag::default().begin_toggle().reconcile(true);
        assert!(flag.value());
        assert!(flag.confirmed);
        assert!(flag.settle_failure().value());
    }

    #[tokio::test]
    async fn test_check_reads_remote_list() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .withf(|u| u == "ada")
            .times(1)
            .returning(|_| Ok(listing(&["heat", "alien"])));
        let (cache, _, _) = logged_in(remote).await;

        assert!(cache.check(&Movie::new("Heat")).await);
        assert!(cache.flag(&Movie::new("HEAT")).await);
    }

    #[tokio::test]
    async fn test_check_failure_keeps_previous_value() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Err(AppError::Timeout));
        let (cache, session, _) = logged_in(remote).await;

        assert!(!cache.check(&Movie::new("Heat")).await);
        assert!(session.is_logged_in());
    }

    #[tokio::test]
    async fn test_check_without_identity_skips_network() {
        let mut remote = MockRecommendationService::new();
        remote.expect_fetch_watchlist().never();
        let remote: Arc<dyn RecommendationService> = Arc::new(remote);
        let session = Arc::new(SessionStore::new(
            remote.clone(),
            Arc::new(MemoryStore::new()),
        ));
        let cache = MembershipCache::new(remote, session, Arc::new(Notifications::new()));

        assert!(!cache.check(&Movie::new("Heat")).await);
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_original() {
        let on_server = Arc::new(AtomicBool::new(false));
        let mut remote = MockRecommendationService::new();
        let added = on_server.clone();
        remote.expect_add_entry().times(1).returning(move |_, _| {
            added.store(true, Ordering::SeqCst);
            Ok(())
        });
        let removed = on_server.clone();
        remote.expect_remove_entry().times(1).returning(move |_, _| {
            removed.store(false, Ordering::SeqCst);
            Ok(())
        });
        let (cache, _, notifications) = logged_in(remote).await;
        let movie = Movie::new("Heat");

        assert!(assert_ok!(cache.toggle(&movie).await));
        assert!(on_server.load(Ordering::SeqCst));
        assert!(!assert_ok!(cache.toggle(&movie).await));
        assert!(!on_server.load(Ordering::SeqCst));
        assert!(!cache.flag(&movie).await);
        assert_eq!(
            notifications.latest().await.unwrap().message,
            "Removed from Watchlist"
        );
    }

    #[tokio::test]
    async fn test_toggle_failure_rolls_back() {
        let mut remote = MockRecommendationService::new();
        remote.expect_add_entry().times(1).returning(|_, _| {
            Err(AppError::Api {
                status: 500,
                message: "Server error".to_string(),
            })
        });
        let (cache, _, notifications) = logged_in(remote).await;
        let movie = Movie::new("Heat");

        let err = cache.toggle(&movie).await.unwrap_err();
        assert!(matches!(err, AppError::Sync(ref msg) if msg == "Server error"));
        assert!(!cache.flag(&movie).await);
        assert!(!cache.is_in_flight(&movie).await);

        let latest = notifications.latest().await.unwrap();
        assert_eq!(latest.kind, NotificationKind::Error);
        assert_eq!(latest.message, "Failed to update watchlist");
    }

    #[tokio::test]
    async fn test_toggle_without_identity_issues_no_call() {
        let mut remote = MockRecommendationService::new();
        remote.expect_add_entry().never();
        remote.expect_remove_entry().never();
        let remote: Arc<dyn RecommendationService> = Arc::new(remote);
        let session = Arc::new(SessionStore::new(
            remote.clone(),
            Arc::new(MemoryStore::new()),
        ));
        let cache = MembershipCache::new(remote, session, Arc::new(Notifications::new()));

        let err = cache.toggle(&Movie::new("Heat")).await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_toggle_unauthorized_clears_session() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_add_entry()
            .returning(|_, _| Err(AppError::Unauthorized("Login required".to_string())));
        let (cache, session, _) = logged_in(remote).await;

        let err = cache.toggle(&Movie::new("Heat")).await.unwrap_err();
        assert!(matches!(err, AppError::Sync(_)));
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn test_flags_are_scoped_per_user() {
        let mut remote = MockRecommendationService::new();
        remote.expect_add_entry().returning(|_, _| Ok(()));
        remote.expect_logout().returning(|| Ok(()));
        let (cache, session, _) = logged_in(remote).await;
        let movie = Movie::new("Heat");

        assert_ok!(cache.toggle(&movie).await);
        assert!(cache.flag(&movie).await);

        session.logout().await;
        assert!(!cache.flag(&movie).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_toggle_while_in_flight_is_refused() {
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let release_rx = std::sync::Mutex::new(release_rx);
        let mut remote = MockRecommendationService::new();
        remote.expect_add_entry().times(1).returning(move |_, _| {
            let _ = release_rx.lock().unwrap().recv();
            Ok(())
        });
        remote.expect_remove_entry().never();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Ok(listing(&[])));
        let (cache, _, _) = logged_in(remote).await;
        let cache = Arc::new(cache);
        let movie = Movie::new("Heat");

        let first = {
            let cache = cache.clone();
            let movie = movie.clone();
            tokio::spawn(async move { cache.toggle(&movie).await })
        };
        while !cache.is_in_flight(&movie).await {
            tokio::task::yield_now().await;
        }

        assert!(cache.flag(&movie).await);
        assert!(matches!(
            cache.toggle(&movie).await,
            Err(AppError::InFlight(_))
        ));
        assert!(cache.check(&movie).await);
        assert!(cache.is_in_flight(&movie).await);

        release_tx.send(()).unwrap();
        assert!(assert_ok!(first.await.unwrap()));
        assert!(!cache.is_in_flight(&movie).await);
        assert!(cache.flag(&movie).await);
    }
}
