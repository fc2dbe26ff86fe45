use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Identity, NewEntry, RecommendedItem, TitleKey, WatchlistEntry, WatchlistStats},
    notify::Notifications,
    services::RecommendationService,
    session::SessionStore,
};

/// Fewer entries than this and collection recommendations are skipped
pub const MIN_ENTRIES_FOR_RECOMMENDATIONS: usize = 2;

pub const ADVISORY_MESSAGE: &str =
    "Add at least 2 movies to your watchlist for better recommendations!";

/// Recommendation panel lifecycle
///
/// `Idle -> Loading -> {Shown, Failed}`. `Shown` returns to `Idle` only
/// through [`WatchlistCollection::dismiss_recommendations`]. `Failed` stays
/// until the user asks again.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RecommendationPanel {
    #[default]
    Idle,
    Loading,
    Shown {
        items: Vec<RecommendedItem>,
        message: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// Result of asking for recommendations from the collection
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// Skipped locally, no request was made
    Advisory(String),
    Shown {
        items: Vec<RecommendedItem>,
        message: Option<String>,
    },
}

/// The full ordered watchlist of one user
///
/// Unlike the membership cache, every mutation here waits for the server
/// before touching the held sequence.
pub struct WatchlistCollection {
    remote: Arc<dyn RecommendationService>,
    session: Arc<SessionStore>,
    notifications: Arc<Notifications>,
    owner: Option<Identity>,
    entries: Vec<WatchlistEntry>,
    stats: WatchlistStats,
    panel: RecommendationPanel,
}

impl WatchlistCollection {
    pub fn new(
        remote: Arc<dyn RecommendationService>,
        session: Arc<SessionStore>,
        notifications: Arc<Notifications>,
    ) -> Self {
        Self {
            remote,
            session,
            notifications,
            owner: None,
            entries: Vec::new(),
            stats: WatchlistStats::default(),
            panel: RecommendationPanel::default(),
        }
    }

    pub fn owner(&self) -> Option<&Identity> {
        self.owner.as_ref()
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn stats(&self) -> WatchlistStats {
        self.stats
    }

    pub fn panel(&self) -> &RecommendationPanel {
        &self.panel
    }

    pub fn contains(&self, title: &str) -> bool {
        let key = TitleKey::new(title);
        self.entries.iter().any(|e| e.key() == key)
    }

    /// Fetches the current user's list and stats, replacing the held copy
    ///
    /// On failure the held copy is left as it was.
    pub async fn load(&mut self) -> AppResult<&[WatchlistEntry]> {
        let identity = self.session.require_identity()?;

        let result = self.remote.fetch_watchlist(&identity.username).await;
        let response = self.session.guard(result).await.map_err(|e| {
            tracing::warn!(username = %identity, error = %e, "Watchlist load failed");
            AppError::Load(e.user_message())
        })?;

        tracing::info!(
            username = %identity,
            entries = response.watchlist.len(),
            total = response.stats.total,
            "Watchlist loaded"
        );

        self.adopt_owner(&identity);
        self.entries = response.watchlist;
        self.stats = response.stats;
        Ok(&self.entries)
    }

    /// Removes an entry once the server confirms it
    ///
    /// A failure leaves the held sequence untouched.
    pub async fn remove(&mut self, title: &str) -> AppResult<()> {
        let identity = self.session.require_identity()?;
        self.adopt_owner(&identity);
        let key = TitleKey::new(title);

        let result = self.remote.remove_entry(&identity.username, title).await;
        if let Err(e) = self.session.guard(result).await {
            tracing::warn!(username = %identity, title = %title, error = %e, "Watchlist removal failed");
            self.notifications.error("Failed to remove movie").await;
            return Err(AppError::Sync(e.user_message()));
        }

        if let Some(index) = self.entries.iter().position(|e| e.key() == key) {
            let removed = self.entries.remove(index);
            self.stats.record_removed(removed.status);
        }

        tracing::info!(username = %identity, title = %title, remaining = self.entries.len(), "Removed from collection");
        self.notifications.success("Movie removed from watchlist!").await;
        Ok(())
    }

    /// Adds an entry once the server confirms it
    pub async fn add(&mut self, entry: NewEntry) -> AppResult<()> {
        let identity = self.session.require_identity()?;
        self.adopt_owner(&identity);
        let title = entry.title.clone();

        let result = self.remote.add_entry(&identity.username, entry.clone()).await;
        if let Err(e) = self.session.guard(result).await {
            tracing::warn!(username = %identity, title = %title, error = %e, "Watchlist add failed");
            self.notifications.error("Failed to update watchlist").await;
            return Err(AppError::Sync(e.user_message()));
        }

        let entry = WatchlistEntry::from(entry);
        self.stats.record_added(entry.status);
        self.entries.push(entry);

        self.notifications.success("Added to Watchlist").await;
        Ok(())
    }

    /// Asks the service for recommendations based on the held list
    ///
    /// With fewer than [`MIN_ENTRIES_FOR_RECOMMENDATIONS`] entries no request
    /// is made and an advisory is returned instead. A message from the service
    /// is passed through unchanged.
    pub async fn recommend_from_collection(&mut self) -> AppResult<RecommendationOutcome> {
        let identity = self.session.require_identity()?;
        self.adopt_owner(&identity);

        match self.panel {
            RecommendationPanel::Loading => {
                return Err(AppError::InFlight(
                    "Recommendations are already loading".to_string(),
                ))
            }
            RecommendationPanel::Shown { .. } => {
                return Err(AppError::InvalidState(
                    "Dismiss the current recommendations first".to_string(),
                ))
            }
            RecommendationPanel::Idle | RecommendationPanel::Failed { .. } => {}
        }

        if self.entries.len() < MIN_ENTRIES_FOR_RECOMMENDATIONS {
            tracing::debug!(entries = self.entries.len(), "Skipping recommendations for short watchlist");
            self.notifications.info(ADVISORY_MESSAGE).await;
            return Ok(RecommendationOutcome::Advisory(ADVISORY_MESSAGE.to_string()));
        }

        self.panel = RecommendationPanel::Loading;

        let result = self.remote.recommend_from_watchlist(&identity.username).await;
        match self.session.guard(result).await {
            Ok(response) => {
                tracing::info!(
                    username = %identity,
                    results = response.recommendations.len(),
                    "Collection recommendations shown"
                );
                self.panel = RecommendationPanel::Shown {
                    items: response.recommendations.clone(),
                    message: response.message.clone(),
                };
                Ok(RecommendationOutcome::Shown {
                    items: response.recommendations,
                    message: response.message,
                })
            }
            Err(e) => {
                tracing::warn!(username = %identity, error = %e, "Collection recommendations failed");
                let message = e.user_message();
                self.panel = RecommendationPanel::Failed {
                    error: message.clone(),
                };
                self.notifications.error("Failed to fetch recommendations").await;
                Err(AppError::Load(message))
            }
        }
    }

    /// Binds the held state to `identity`, dropping anything held for another user
    fn adopt_owner(&mut self, identity: &Identity) {
        match &self.owner {
            Some(owner) if owner == identity => return,
            Some(owner) => {
                tracing::info!(
                    previous = %owner,
                    username = %identity,
                    discarded = self.entries.len(),
                    "Watchlist owner changed, clearing held collection"
                );
                self.entries.clear();
                self.stats = WatchlistStats::default();
                self.panel = RecommendationPanel::Idle;
            }
            None => {}
        }
        self.owner = Some(identity.clone());
    }

    /// Closes a shown panel; other states are left alone
    pub fn dismiss_recommendations(&mut self) -> bool {
        if matches!(self.panel, RecommendationPanel::Shown { .. }) {
            self.panel = RecommendationPanel::Idle;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{KeyValueStore, MemoryStore, StorageKey};
    use crate::models::wire::WatchlistResponse;
    use crate::models::{Movie, RecommendationResponse, WatchStatus};
    use crate::notify::NotificationKind;
    use crate::services::providers::MockRecommendationService;
    use tokio_test::assert_ok;

    fn entry(title: &str, status: WatchStatus) -> WatchlistEntry {
        WatchlistEntry {
            title: title.to_string(),
            poster_path: None,
            genres: None,
            overview: None,
            status,
            rating: None,
        }
    }

    fn response(entries: Vec<WatchlistEntry>) -> WatchlistResponse {
        WatchlistResponse {
            user: Some(Identity::new("ada")),
            stats: WatchlistStats::from_entries(&entries),
            watchlist: entries,
        }
    }

    fn three_entries() -> WatchlistResponse {
        response(vec![
            entry("Alpha", WatchStatus::PlanToWatch),
            entry("Beta", WatchStatus::Watching),
            entry("Gamma", WatchStatus::Completed),
        ])
    }

    async fn collection(
        remote: MockRecommendationService,
    ) -> (WatchlistCollection, Arc<SessionStore>, Arc<Notifications>) {
        let remote: Arc<dyn RecommendationService> = Arc::new(remote);
        let store = Arc::new(MemoryStore::new());
        store
            .set(StorageKey::User, "ada".to_string())
            .await
            .unwrap();
        let session = Arc::new(SessionStore::new(remote.clone(), store));
        session.restore_on_startup().await;
        let notifications = Arc::new(Notifications::new());
        let collection = WatchlistCollection::new(remote, session.clone(), notifications.clone());
        (collection, session, notifications)
    }

    #[tokio::test]
    async fn test_load_replaces_entries_and_stats() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .withf(|u| u == "ada")
            .times(1)
            .returning(|_| Ok(three_entries()));
        let (mut collection, _, _) = collection(remote).await;

        let entries = assert_ok!(collection.load().await);
        assert_eq!(entries.len(), 3);
        assert_eq!(collection.stats().total, 3);
        assert_eq!(collection.owner(), Some(&Identity::new("ada")));
        assert!(collection.contains("beta"));
    }

    #[tokio::test]
    async fn test_load_failure_is_load_error() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Err(AppError::Timeout));
        let (mut collection, _, _) = collection(remote).await;

        let err = collection.load().await.unwrap_err();
        assert!(matches!(err, AppError::Load(_)));
        assert!(collection.entries().is_empty());
    }

    #[tokio::test]
    async fn test_remove_drops_exactly_one_entry() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Ok(three_entries()));
        remote
            .expect_remove_entry()
            .withf(|u, t| u == "ada" && t == "Alpha")
            .times(1)
            .returning(|_, _| Ok(()));
        let (mut collection, _, notifications) = collection(remote).await;
        collection.load().await.unwrap();

        assert_ok!(collection.remove("Alpha").await);
        let titles: Vec<_> = collection.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Beta", "Gamma"]);
        assert_eq!(collection.stats().total, 2);
        assert_eq!(collection.stats().plan_to_watch, 0);
        assert_eq!(
            notifications.latest().await.unwrap().message,
            "Movie removed from watchlist!"
        );
    }

    #[tokio::test]
    async fn test_remove_failure_keeps_entry() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Ok(three_entries()));
        remote.expect_remove_entry().returning(|_, _| {
            Err(AppError::Api {
                status: 404,
                message: "Movie not in watchlist".to_string(),
            })
        });
        let (mut collection, _, notifications) = collection(remote).await;
        collection.load().await.unwrap();

        let err = collection.remove("Alpha").await.unwrap_err();
        assert!(matches!(err, AppError::Sync(ref msg) if msg == "Movie not in watchlist"));
        assert_eq!(collection.entries().len(), 3);
        assert_eq!(collection.stats().total, 3);
        assert_eq!(
            notifications.latest().await.unwrap().kind,
            NotificationKind::Error
        );
    }

    #[tokio::test]
    async fn test_add_appends_after_confirmation() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_add_entry()
            .withf(|_, e| e.title == "Heat" && e.status == WatchStatus::Watching)
            .times(1)
            .returning(|_, _| Ok(()));
        let (mut collection, _, _) = collection(remote).await;

        let new_entry = Movie::new("Heat").to_new_entry(WatchStatus::Watching, None);
        assert_ok!(collection.add(new_entry).await);
        assert_eq!(collection.entries().len(), 1);
        assert_eq!(collection.stats().watching, 1);
    }

    #[tokio::test]
    async fn test_short_collection_gets_advisory_without_network() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Ok(response(vec![entry("Alpha", WatchStatus::PlanToWatch)])));
        remote.expect_recommend_from_watchlist().never();
        let (mut collection, _, notifications) = collection(remote).await;

        let outcome = assert_ok!(collection.recommend_from_collection().await);
        assert_eq!(outcome, RecommendationOutcome::Advisory(ADVISORY_MESSAGE.to_string()));

        collection.load().await.unwrap();
        let outcome = assert_ok!(collection.recommend_from_collection().await);
        assert!(matches!(outcome, RecommendationOutcome::Advisory(_)));
        assert_eq!(collection.panel(), &RecommendationPanel::Idle);
        assert_eq!(
            notifications.latest().await.unwrap().kind,
            NotificationKind::Info
        );
    }

    #[tokio::test]
    async fn test_recommendations_issue_exactly_one_call_and_keep_message() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Ok(three_entries()));
        remote
            .expect_recommend_from_watchlist()
            .times(1)
            .returning(|_| {
                Ok(RecommendationResponse {
                    recommendations: vec![],
                    message: Some("Not enough genre overlap yet".to_string()),
                })
            });
        let (mut collection, _, _) = collection(remote).await;
        collection.load().await.unwrap();

        let outcome = assert_ok!(collection.recommend_from_collection().await);
        assert_eq!(
            outcome,
            RecommendationOutcome::Shown {
                items: vec![],
                message: Some("Not enough genre overlap yet".to_string()),
            }
        );

        let err = collection.recommend_from_collection().await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        assert!(collection.dismiss_recommendations());
        assert_eq!(collection.panel(), &RecommendationPanel::Idle);
        assert!(!collection.dismiss_recommendations());
    }

    #[tokio::test]
    async fn test_failed_recommendations_can_be_requested_again() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Ok(three_entries()));
        let mut attempts = 0;
        remote
            .expect_recommend_from_watchlist()
            .times(2)
            .returning(move |_| {
                attempts += 1;
                if attempts == 1 {
                    Err(AppError::Timeout)
                } else {
                    Ok(RecommendationResponse::default())
                }
            });
        let (mut collection, _, _) = collection(remote).await;
        collection.load().await.unwrap();

        let err = collection.recommend_from_collection().await.unwrap_err();
        assert!(matches!(err, AppError::Load(_)));
        assert!(matches!(collection.panel(), RecommendationPanel::Failed { .. }));
        assert!(!collection.dismiss_recommendations());

        assert_ok!(collection.recommend_from_collection().await);
        assert!(matches!(collection.panel(), RecommendationPanel::Shown { .. }));
    }

    #[tokio::test]
    async fn test_unauthorized_load_clears_identity() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .returning(|_| Err(AppError::Unauthorized("Login required".to_string())));
        let (mut collection, session, _) = collection(remote).await;

        assert!(collection.load().await.is_err());
        assert!(!session.is_logged_in());
        assert!(matches!(
            collection.load().await,
            Err(AppError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_switching_user_drops_previous_collection() {
        let mut remote = MockRecommendationService::new();
        remote
            .expect_fetch_watchlist()
            .withf(|u| u == "ada")
            .times(1)
            .returning(|_| Ok(three_entries()));
        remote.expect_logout().returning(|| Ok(()));
        remote
            .expect_login()
            .withf(|u, _| u == "bob")
            .returning(|_, _| Ok(None));
        remote.expect_recommend_from_watchlist().never();
        let (mut collection, session, notifications) = collection(remote).await;
        collection.load().await.unwrap();
        assert_eq!(collection.entries().len(), 3);

        session.logout().await;
        session.login("bob", "secret").await.unwrap();

        let outcome = assert_ok!(collection.recommend_from_collection().await);
        assert_eq!(outcome, RecommendationOutcome::Advisory(ADVISORY_MESSAGE.to_string()));
        assert_eq!(collection.owner(), Some(&Identity::new("bob")));
        assert!(collection.entries().is_empty());
        assert_eq!(collection.stats(), WatchlistStats::default());
        assert!(!collection.contains("Alpha"));
        assert_eq!(
            notifications.latest().await.unwrap().kind,
            NotificationKind::Info
        );
    }

    #[tokio::test]
    async fn test_logged_out_recommendations_require_identity() {
        let mut remote = MockRecommendationService::new();
        remote.expect_logout().returning(|| Ok(()));
        remote.expect_recommend_from_watchlist().never();
        let (mut collection, session, _) = collection(remote).await;
        session.logout().await;

        assert!(matches!(
            collection.recommend_from_collection().await,
            Err(AppError::NotAuthenticated)
        ));
    }
}
