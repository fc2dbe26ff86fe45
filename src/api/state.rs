use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Movie, TitleKey, WatchlistEntry};

use super::catalog;

/// Shared state of the stub service
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
}

/// Inner state that can be modified
pub struct AppStateInner {
    /// Username to password
    pub users: HashMap<String, String>,
    /// Session cookie value to username
    pub sessions: HashMap<Uuid, String>,
    pub watchlists: HashMap<String, Vec<WatchlistEntry>>,
    pub catalog: Vec<Movie>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Creates a state with no users and the seed catalog
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner {
                users: HashMap::new(),
                sessions: HashMap::new(),
                watchlists: HashMap::new(),
                catalog: catalog::seed_catalog(),
            })),
        }
    }
}

impl AppStateInner {
    /// Username owning the session, if it is still live
    pub fn session_user(&self, session: Option<Uuid>) -> Option<&str> {
        session
            .and_then(|id| self.sessions.get(&id))
            .map(String::as_str)
    }

    pub fn watchlist(&self, username: &str) -> &[WatchlistEntry] {
        self.watchlists
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn position(&self, username: &str, key: &TitleKey) -> Option<usize> {
        self.watchlist(username).iter().position(|e| e.key() == *key)
    }
}
