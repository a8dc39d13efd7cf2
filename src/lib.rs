//! Circulation Server
//!
//! Loan lifecycle engine of a community-library network: lending copies to
//! readers, renewing and returning loans, overdue classification and reminder
//! throttling, exposed over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod circulation;
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
