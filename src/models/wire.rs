//! Request and response bodies exchanged with the recommendation service.
//!
//! Shared by the HTTP client and the development stub so both sides agree on
//! field names.

use serde::{Deserialize, Serialize};

use super::{Identity, NewEntry, WatchlistEntry, WatchlistStats};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Generic `{ "message": ... }` body returned by most endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistResponse {
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub stats: WatchlistStats,
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEntryRequest {
    pub username: String,
    #[serde(flatten)]
    pub entry: NewEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveEntryRequest {
    pub username: String,
    pub movie_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, WatchStatus};

    #[test]
    fn test_add_request_is_flat() {
        let request = AddEntryRequest {
            username: "ada".to_string(),
            entry: NewEntry {
                title: "Heat".to_string(),
                poster_path: None,
                genres: None,
                overview: None,
                status: WatchStatus::Completed,
                rating: Rating::try_from(9).ok(),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["username"], "ada");
        assert_eq!(value["title"], "Heat");
        assert_eq!(value["status"], "Completed");
        assert_eq!(value["rating"], 9);
    }

    #[test]
    fn test_watchlist_response_tolerates_missing_sections() {
        let parsed: WatchlistResponse = serde_json::from_str(r#"{ "watchlist": [] }"#).unwrap();
        assert!(parsed.user.is_none());
        assert_eq!(parsed.stats, WatchlistStats::default());
    }
}
