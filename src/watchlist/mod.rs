//! Local views over a user's remote watchlist
//!
//! [`MembershipCache`] answers the per-title question with optimistic toggles.
//! [`WatchlistCollection`] holds the whole list and only changes after the
//! server confirms.

pub mod collection;
pub mod membership;

pub use collection::{
    RecommendationOutcome, RecommendationPanel, WatchlistCollection, ADVISORY_MESSAGE,
    MIN_ENTRIES_FOR_RECOMMENDATIONS,
};
pub use membership::{MembershipCache, MembershipFlag};
