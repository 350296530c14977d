//! Library lending server
//!
//! Tracks books, borrowers and lending activity, enforces per-book copy
//! limits when lending, and answers borrowing analytics over a REST JSON API.

use std::sync::Arc;

pub mod analytics;
pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
