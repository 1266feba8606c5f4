//! BookNest Lending Ledger Service
//!
//! A Rust implementation of the BookNest library backend, providing a REST
//! JSON API for book cataloging, borrowing/returning with overdue fines,
//! and pre-booking of out-of-stock titles.

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
