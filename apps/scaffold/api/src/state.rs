//! Application state management.
//!
//! This module defines the shared application state passed to request handlers
//! that need more than their domain service, such as the readiness check.

/// Shared application state.
///
/// Cloned per handler; the connection pool is reference counted internally.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: sea_orm::DatabaseConnection,
}
