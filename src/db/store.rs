use std::fmt::Display;

use crate::error::AppResult;

/// Keys of the locally persisted markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Username of the last logged-in identity
    User,
    /// Last selected display mode
    Theme,
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::User => write!(f, "user"),
            StorageKey::Theme => write!(f, "theme"),
        }
    }
}

/// Key-value storage surviving application restarts
///
/// A `set` or `remove` that returns `Ok` is durable: a following `get`, in
/// this process or the next, observes it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: StorageKey) -> AppResult<Option<String>>;

    async fn set(&self, key: StorageKey, value: String) -> AppResult<()>;

    async fn remove(&self, key: StorageKey) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_display() {
        assert_eq!(format!("{}", StorageKey::User), "user");
        assert_eq!(format!("{}", StorageKey::Theme), "theme");
    }
}
