//! In-memory development stub of the recommendation service
//!
//! Serves the same paths and bodies as the real service so the client layer
//! can be exercised end to end without it.

pub mod catalog;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
