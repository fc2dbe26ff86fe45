use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{KeyValueStore, StorageKey};
use crate::error::AppResult;

/// Process-local store, used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given entries
    pub fn with_entries(entries: impl IntoIterator<Item = (StorageKey, String)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> AppResult<()> {
        self.entries.write().await.remove(&key);
        Ok(())
    }
}
