/// Recommendation service abstraction
///
/// Everything this layer knows about the remote service goes through the
/// [`RecommendationService`] trait: session calls, the watchlist resource,
/// both recommendation flavours and the conversational assistant. Components
/// hold it as `Arc<dyn RecommendationService>` so tests can swap in a mock.
use crate::{
    error::AppResult,
    models::{wire::WatchlistResponse, NewEntry, RecommendationResponse},
};

pub mod http;

pub use http::HttpRecommendationService;

/// Trait for the remote recommendation service
///
/// Implementations report HTTP 401/403 as `AppError::Unauthorized` and any
/// other rejection as `AppError::Api` carrying the service's message, so
/// callers can tell "your session is gone" apart from "the service said no".
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationService: Send + Sync {
    /// Create an account. Returns the service's confirmation message.
    async fn signup(&self, username: &str, password: &str) -> AppResult<Option<String>>;

    /// Establish a remote session. Returns the service's auxiliary message.
    async fn login(&self, username: &str, password: &str) -> AppResult<Option<String>>;

    /// Invalidate the remote session
    async fn logout(&self) -> AppResult<()>;

    /// Fetch a user's full watchlist with aggregate stats
    async fn fetch_watchlist(&self, username: &str) -> AppResult<WatchlistResponse>;

    /// Add an entry to a user's watchlist
    async fn add_entry(&self, username: &str, entry: NewEntry) -> AppResult<()>;

    /// Remove an entry from a user's watchlist by title
    async fn remove_entry(&self, username: &str, title: &str) -> AppResult<()>;

    /// Recommendations derived from a user's whole watchlist
    async fn recommend_from_watchlist(&self, username: &str) -> AppResult<RecommendationResponse>;

    /// Recommendations seeded by a single title
    async fn recommend_for_title(&self, title: &str) -> AppResult<RecommendationResponse>;

    /// Send one free-text message to the assistant and return its raw reply
    async fn chat(&self, message: &str) -> AppResult<String>;

    /// Service name for logging and debugging
    fn name(&self) -> &'static str;
}
