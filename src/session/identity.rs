use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    db::{KeyValueStore, StorageKey},
    error::{AppError, AppResult},
    models::{Identity, LoginOutcome},
    services::RecommendationService,
};

/// Sole owner of the current authenticated identity
///
/// Every other component reads the identity through [`SessionStore::current`]
/// or [`SessionStore::require_identity`] and gets its own copy. Only login,
/// logout, restore and invalidation write it.
pub struct SessionStore {
    remote: Arc<dyn RecommendationService>,
    store: Arc<dyn KeyValueStore>,
    identity: watch::Sender<Option<Identity>>,
}

impl SessionStore {
    pub fn new(remote: Arc<dyn RecommendationService>, store: Arc<dyn KeyValueStore>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            remote,
            store,
            identity,
        }
    }

    /// Rebuilds a provisional identity from the persisted username
    ///
    /// The remote service is not contacted. The identity stays valid until a
    /// protected call comes back unauthorized, see [`SessionStore::guard`].
    pub async fn restore_on_startup(&self) -> Option<Identity> {
        let restored = match self.store.get(StorageKey::User).await {
            Ok(Some(username)) if !username.trim().is_empty() => Some(Identity::new(username)),
            Ok(Some(_)) => {
                self.forget_persisted().await;
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to restore persisted identity");
                self.forget_persisted().await;
                None
            }
        };

        match &restored {
            Some(identity) => tracing::info!(username = %identity, "Restored provisional identity"),
            None => tracing::debug!("No persisted identity to restore"),
        }

        self.identity.send_replace(restored.clone());
        restored
    }

    /// Copy of the live identity, if any
    pub fn current(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.borrow().is_some()
    }

    /// Gate for mutating operations; callers redirect to signup on `NotAuthenticated`
    pub fn require_identity(&self) -> AppResult<Identity> {
        self.current().ok_or(AppError::NotAuthenticated)
    }

    /// Change notifications for login, logout and invalidation
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    /// Creates an account without logging in
    pub async fn signup(&self, username: &str, password: &str) -> AppResult<Option<String>> {
        validate_credentials(username, password)?;

        self.remote
            .signup(username.trim(), password)
            .await
            .map_err(|e| {
                tracing::info!(username = %username, error = %e, "Signup rejected");
                AppError::Auth(e.user_message())
            })
    }

    /// Authenticates against the remote service
    ///
    /// On success the username is persisted before the identity becomes
    /// visible to subscribers. Failures are surfaced once, never retried.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        validate_credentials(username, password)?;
        let username = username.trim();

        let message = self.remote.login(username, password).await.map_err(|e| {
            tracing::info!(username = %username, error = %e, "Login rejected");
            match e {
                AppError::Api { message, .. } | AppError::Unauthorized(message) => {
                    AppError::Auth(message)
                }
                other => AppError::Auth(format!("Login failed: {}", other.user_message())),
            }
        })?;

        if let Err(e) = self.store.set(StorageKey::User, username.to_string()).await {
            tracing::warn!(username = %username, error = %e, "Failed to persist username");
        }

        let identity = Identity::new(username);
        self.identity.send_replace(Some(identity.clone()));
        tracing::info!(username = %identity, "Logged in");

        Ok(LoginOutcome { identity, message })
    }

    /// Clears local identity first, then tells the remote service
    ///
    /// A failing remote call is logged and swallowed; local logout always
    /// completes.
    pub async fn logout(&self) {
        let previous = self.clear_local().await;

        if let Err(e) = self.remote.logout().await {
            tracing::warn!(error = %e, "Remote logout failed after local cleanup");
        }

        if let Some(identity) = previous {
            tracing::info!(username = %identity, "Logged out");
        }
    }

    /// Drops the identity after the service rejected it
    pub async fn invalidate(&self) {
        if let Some(identity) = self.clear_local().await {
            tracing::warn!(username = %identity, "Session rejected by service, re-authentication required");
        }
    }

    /// Passes `result` through, invalidating the session on an authorization failure
    pub async fn guard<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.invalidate().await;
            }
        }
        result
    }

    async fn clear_local(&self) -> Option<Identity> {
        let previous = self.identity.send_replace(None);
        self.forget_persisted().await;
        previous
    }

    async fn forget_persisted(&self) {
        if let Err(e) = self.store.remove(StorageKey::User).await {
            tracing::warn!(error = %e, "Failed to remove persisted username");
        }
    }
}

fn validate_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::Auth(
            "Username and password are required".to_string(),
        ));
    }
    Ok(())
}
