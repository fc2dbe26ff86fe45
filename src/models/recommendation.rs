use serde::{Deserialize, Serialize};

/// A film suggested by the recommendation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    /// Why the service picked this item
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response body of both recommendation endpoints
///
/// `message` carries informational text such as "not enough signal" and is
/// surfaced verbatim alongside whatever results came back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub recommendations: Vec<RecommendedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
