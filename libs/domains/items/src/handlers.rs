use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    IdPath, PageParams, Paginated, ValidatedJson, ValidatedQuery,
    errors::responses::{
        InternalServerErrorResponse, InvalidPathParamResponse, NotFoundResponse,
        ServiceUnavailableResponse, ValidationErrorResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{ItemError, ItemResult};
use crate::models::{CreateItem, Item, UpdateItem};
use crate::repository::ItemRepository;
use crate::service::ItemService;

/// Path the item router is nested under, relative to `/api`.
pub const ITEMS_PATH: &str = "/v1/items";
pub const TAG: &str = "items";

/// OpenAPI documentation for Items API
#[derive(OpenApi)]
#[openapi(
    paths(list_items, create_item, get_item, update_item, delete_item),
    components(
        schemas(Item, CreateItem, UpdateItem, Paginated<Item>),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            InvalidPathParamResponse,
            InternalServerErrorResponse,
            ServiceUnavailableResponse
        )
    ),
    tags(
        (name = TAG, description = "Item management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the item router with all HTTP endpoints
pub fn router<R: ItemRepository + 'static>(service: ItemService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/{item_id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(shared_service)
}

/// List items, newest first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(PageParams),
    responses(
        (status = 200, description = "One page of items", body = Paginated<Item>),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn list_items<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    ValidatedQuery(params): ValidatedQuery<PageParams>,
) -> ItemResult<Json<Paginated<Item>>> {
    let page = service.list_page(params).await?;
    Ok(Json(page))
}

/// Create a new item
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created successfully", body = Item),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn create_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateItem>,
) -> ItemResult<impl IntoResponse> {
    let item = service.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Get an item by ID
#[utoipa::path(
    get,
    path = "/{item_id}",
    tag = TAG,
    params(
        ("item_id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = Item),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = InvalidPathParamResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    IdPath(id): IdPath,
) -> ItemResult<Json<Item>> {
    let item = service.get_item(id).await?.ok_or(ItemError::NotFound(id))?;
    Ok(Json(item))
}

/// Partially update an item; omitted fields are left unchanged
#[utoipa::path(
    put,
    path = "/{item_id}",
    tag = TAG,
    params(
        ("item_id" = i64, Path, description = "Item ID")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated successfully", body = Item),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateItem>,
) -> ItemResult<Json<Item>> {
    let item = service
        .update_item(id, input)
        .await?
        .ok_or(ItemError::NotFound(id))?;
    Ok(Json(item))
}

/// Delete an item
#[utoipa::path(
    delete,
    path = "/{item_id}",
    tag = TAG,
    params(
        ("item_id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted successfully"),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = InvalidPathParamResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    IdPath(id): IdPath,
) -> ItemResult<StatusCode> {
    if service.delete_item(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ItemError::NotFound(id))
    }
}
