//! The explicit application session
//!
//! [`AppSession`] is built once at startup and cloned into every component
//! that needs the identity, the theme or the remote service. Nothing is looked
//! up ambiently.

use std::sync::Arc;

use crate::{
    config::Config,
    db::{FileStore, KeyValueStore},
    error::{AppError, AppResult},
    exchange::ChatPanel,
    models::RecommendationResponse,
    notify::Notifications,
    services::{HttpRecommendationService, RecommendationService},
    watchlist::{MembershipCache, WatchlistCollection},
};

pub mod identity;
pub mod theme;

pub use identity::SessionStore;
pub use theme::{ThemeSignal, ThemeSnapshot, ThemeSubscription};

#[derive(Clone)]
pub struct AppSession {
    remote: Arc<dyn RecommendationService>,
    identity: Arc<SessionStore>,
    theme: Arc<ThemeSignal>,
    notifications: Arc<Notifications>,
}

impl AppSession {
    /// Builds a session backed by the HTTP client and the on-disk store
    pub async fn bootstrap(config: &Config) -> AppResult<Self> {
        let store = FileStore::open(&config.state_path).await?;
        let remote = HttpRecommendationService::new(config)?;

        tracing::info!(
            api_url = %config.api_url,
            state_path = %config.state_path.display(),
            "Bootstrapping application session"
        );

        Ok(Self::with_services(Arc::new(remote), Arc::new(store)).await)
    }

    /// Builds a session from explicit collaborators and restores persisted state
    pub async fn with_services(
        remote: Arc<dyn RecommendationService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let identity = Arc::new(SessionStore::new(remote.clone(), store.clone()));
        identity.restore_on_startup().await;
        let theme = Arc::new(ThemeSignal::restore(store).await);

        Self {
            remote,
            identity,
            theme,
            notifications: Arc::new(Notifications::new()),
        }
    }

    pub fn identity(&self) -> &Arc<SessionStore> {
        &self.identity
    }

    pub fn theme(&self) -> &Arc<ThemeSignal> {
        &self.theme
    }

    pub fn notifications(&self) -> &Arc<Notifications> {
        &self.notifications
    }

    pub fn remote(&self) -> &Arc<dyn RecommendationService> {
        &self.remote
    }

    pub fn membership_cache(&self) -> MembershipCache {
        MembershipCache::new(
            self.remote.clone(),
            self.identity.clone(),
            self.notifications.clone(),
        )
    }

    pub fn watchlist(&self) -> WatchlistCollection {
        WatchlistCollection::new(
            self.remote.clone(),
            self.identity.clone(),
            self.notifications.clone(),
        )
    }

    pub fn chat_panel(&self) -> ChatPanel {
        ChatPanel::new(self.remote.clone())
    }

    /// Recommendations seeded by one title; needs no login
    pub async fn recommend_for_title(&self, title: &str) -> AppResult<RecommendationResponse> {
        self.remote.recommend_for_title(title).await.map_err(|e| {
            tracing::warn!(seed = %title, error = %e, "Title recommendations failed");
            AppError::Load(e.user_message())
        })
    }
}
