use axum::Router;
use axum_helpers::server::{close_postgres, create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use migration::Migrator;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

/// Assemble the full application: docs, `/api` routes, `/health` and `/ready`.
fn build_app(state: &AppState) -> eyre::Result<Router> {
    let api_routes = api::routes(state);

    // - /health: liveness check with app name/version
    // - /ready: readiness check against the database
    let health_routes = health_router(state.config.app).merge(api::ready_router(state.clone()));

    // create_router adds docs/middleware to our composed routes
    let router = axum_helpers::create_router::<openapi::ApiDoc>(
        api_routes,
        health_routes,
        &state.config.cors,
    )?;

    Ok(router)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.run_migrations {
        database::postgres::run_migrations::<Migrator>(&db, config.app.name)
            .await
            .map_err(|e| eyre::eyre!("Database migration failed: {}", e))?;
    } else {
        info!("Skipping database migrations (DB_RUN_MIGRATIONS=false)");
    }

    let state = AppState { config, db };
    let app = build_app(&state)?;

    info!(
        app = state.config.app.name,
        version = state.config.app.version,
        environment = state.config.environment.as_str(),
        "Starting API with graceful shutdown (30s timeout)"
    );

    // State moves here for cleanup
    let AppState { config, db } = state;
    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        close_postgres(db, "main").await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("API shutdown complete");
    Ok(())
}
