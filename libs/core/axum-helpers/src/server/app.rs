use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{create_cors_layer, security_headers};
use axum::{Router, middleware};
use core_config::cors::CorsConfig;
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable as RedocServable};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Creates a configured Axum router with common middleware and documentation.
///
/// This function sets up:
/// - OpenAPI documentation at [`OPENAPI_JSON_PATH`], with Swagger UI (`/docs`),
///   ReDoc (`/redoc`), RapiDoc (`/rapidoc`) and Scalar (`/scalar`)
/// - API routes nested under `/api`
/// - `root` routes (health and readiness checks) merged at the top level
/// - JSON 404 and 405 fallbacks
/// - Request tracing, security headers, CORS and response compression,
///   covering every route above
///
/// Domain routers apply their own state before being passed in.
///
/// # Errors
/// Fails if a configured CORS origin is not a valid header value.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::create_router;
/// use core_config::cors::CorsConfig;
///
/// let api_routes = Router::new().nest("/v1/items", items_router);
/// let health_routes = health_router(app_info!()).merge(ready_router);
/// let router = create_router::<ApiDoc>(api_routes, health_routes, &CorsConfig::default())?;
/// ```
pub fn create_router<T>(apis: Router, root: Router, cors: &CorsConfig) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let cors_layer = create_cors_layer(cors)?;
    info!(origins = ?cors.allowed_origins, "CORS configured");

    let router = Router::new()
        .merge(SwaggerUi::new("/docs").url(OPENAPI_JSON_PATH, T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new(OPENAPI_JSON_PATH).path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest("/api", apis)
        .merge(root)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer)
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Serve `router` until SIGINT/SIGTERM, then run `cleanup` within `shutdown_timeout`.
///
/// In-flight requests are drained before cleanup (closing pools) starts.
/// Cleanup still runs when the server stops on an error, and is abandoned
/// with a warning once the timeout elapses.
///
/// # Example
/// ```ignore
/// use std::time::Duration;
/// use axum_helpers::server::{close_postgres, create_production_app};
///
/// create_production_app(
///     router,
///     &config.server,
///     Duration::from_secs(30),
///     async move { close_postgres(db, "main").await },
/// )
/// .await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::default();
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!(address = %listener.local_addr()?, "Server starting");

    let signal_handle = coordinator.clone();
    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { signal_handle.wait_for_signal().await })
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Server encountered an error"));

    coordinator.shutdown();

    info!(timeout = ?shutdown_timeout, "Starting cleanup tasks");
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => warn!(timeout = ?shutdown_timeout, "Cleanup exceeded timeout, forcing shutdown"),
    }

    serve_result
}
