pub mod providers;

pub use providers::{HttpRecommendationService, RecommendationService};
