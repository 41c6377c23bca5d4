//! Biblioteca School Library Server
//!
//! A Rust REST backend for a school library: students browse the catalog
//! and request loans, staff approve pickups, track due dates and record
//! returns. The loan lifecycle engine keeps book availability consistent
//! with loan state.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod ticket;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
