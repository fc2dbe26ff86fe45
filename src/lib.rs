//! Client-side session and synchronization layer for a movie discovery app
//!
//! Holds the authenticated identity, keeps watchlist views in step with the
//! remote recommendation service, publishes the display theme to any number
//! of observers and drives the assistant chat. The `api` module is an
//! in-memory stub of the remote service used for local development and
//! end-to-end tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod services;
pub mod session;
pub mod watchlist;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use session::AppSession;
