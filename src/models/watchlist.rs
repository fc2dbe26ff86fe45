use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Viewing status of a watchlist entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchStatus {
    #[default]
    #[serde(rename = "Plan to Watch")]
    PlanToWatch,
    Watching,
    Completed,
    Dropped,
}

impl WatchStatus {
    pub const ALL: &[WatchStatus] = &[
        Self::PlanToWatch,
        Self::Watching,
        Self::Completed,
        Self::Dropped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlanToWatch => "Plan to Watch",
            Self::Watching => "Watching",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
        }
    }
}

impl Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user rating in the range 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Natural key of a watchlist entry
///
/// The remote service stores titles trimmed and lower-cased, so lookups and
/// removals compare on that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TitleKey(String);

impl TitleKey {
    pub fn new(title: &str) -> Self {
        Self(title.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, title: &str) -> bool {
        self.0 == title.trim().to_lowercase()
    }
}

impl Display for TitleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A movie as shown on a card or details page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl Movie {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            poster_path: None,
            genres: None,
            overview: None,
        }
    }

    pub fn key(&self) -> TitleKey {
        TitleKey::new(&self.title)
    }

    /// Builds the add payload for this movie
    pub fn to_new_entry(&self, status: WatchStatus, rating: Option<Rating>) -> NewEntry {
        NewEntry {
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
            genres: self.genres.clone(),
            overview: self.overview.clone(),
            status,
            rating,
        }
    }
}

/// Payload of an "add to watchlist" call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub title: String,
    pub poster_path: Option<String>,
    pub genres: Option<String>,
    pub overview: Option<String>,
    #[serde(default)]
    pub status: WatchStatus,
    pub rating: Option<Rating>,
}

impl From<NewEntry> for WatchlistEntry {
    fn from(entry: NewEntry) -> Self {
        Self {
            title: entry.title,
            poster_path: entry.poster_path,
            genres: entry.genres,
            overview: entry.overview,
            status: entry.status,
            rating: entry.rating,
        }
    }
}

/// One entry of a user's remote watchlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub status: WatchStatus,
    #[serde(default)]
    pub rating: Option<Rating>,
}

impl WatchlistEntry {
    pub fn key(&self) -> TitleKey {
        TitleKey::new(&self.title)
    }
}

/// Aggregate counts over a watchlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistStats {
    pub total: usize,
    #[serde(rename = "Plan to Watch")]
    pub plan_to_watch: usize,
    #[serde(rename = "Watching")]
    pub watching: usize,
    #[serde(rename = "Completed")]
    pub completed: usize,
    #[serde(rename = "Dropped")]
    pub dropped: usize,
}

impl WatchlistStats {
    pub fn from_entries(entries: &[WatchlistEntry]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.record_added(entry.status);
        }
        stats
    }

    pub fn count(&self, status: WatchStatus) -> usize {
        match status {
            WatchStatus::PlanToWatch => self.plan_to_watch,
            WatchStatus::Watching => self.watching,
            WatchStatus::Completed => self.completed,
            WatchStatus::Dropped => self.dropped,
        }
    }

    fn bucket_mut(&mut self, status: WatchStatus) -> &mut usize {
        match status {
            WatchStatus::PlanToWatch => &mut self.plan_to_watch,
            WatchStatus::Watching => &mut self.watching,
            WatchStatus::Completed => &mut self.completed,
            WatchStatus::Dropped => &mut self.dropped,
        }
    }

    pub fn record_added(&mut self, status: WatchStatus) {
        self.total += 1;
        *self.bucket_mut(status) += 1;
    }

    pub fn record_removed(&mut self, status: WatchStatus) {
        self.total = self.total.saturating_sub(1);
        let bucket = self.bucket_mut(status);
        *bucket = bucket.saturating_sub(1);
    }
}
