//! Libris Library Server
//!
//! REST JSON API for a small library: catalog of books, authors and
//! genres, reader accounts, and the loan lifecycle that keeps shelf
//! counts consistent with outstanding loans.

use std::sync::Arc;

pub mod api;
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
