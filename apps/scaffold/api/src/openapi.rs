use utoipa::OpenApi;

/// Top-level OpenAPI document; domain documents are nested under their mount paths.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scaffold API",
        version = "0.1.0",
        description = "CRUD service for items"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    components(schemas(axum_helpers::ErrorResponse)),
    nest(
        (path = "/v1/items", api = domain_items::ApiDoc)
    )
)]
pub struct ApiDoc;
