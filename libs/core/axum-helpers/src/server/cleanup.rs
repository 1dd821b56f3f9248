//! Resource cleanup run after the server stops accepting requests.

use tracing::{error, info};

/// Close a SeaORM pool, logging the outcome.
///
/// ```ignore
/// use axum_helpers::server::close_postgres;
///
/// close_postgres(db, "main").await;
/// ```
pub async fn close_postgres(db: sea_orm::DatabaseConnection, name: &str) {
    match db.close().await {
        Ok(_) => info!(pool = name, "PostgreSQL connection pool closed"),
        Err(e) => error!(pool = name, error = %e, "Error closing PostgreSQL connection pool"),
    }
}
