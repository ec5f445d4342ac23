use crate::domain::{StoreId, StoreInput};
use crate::transport::http::handlers::common::{respond, store_error_response};
use crate::transport::http::types::{json_422, ApiResponse, AppState, ListStoresQuery};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

const STORE_BODY: &str =
    "{\"name\": ..., \"location\": {\"coordinates\": [lng, lat], \"address\": ...}, \"author\": ...}";

#[utoipa::path(
    get,
    path = "/api/stores",
    params(ListStoresQuery),
    responses(
        (status = 200, description = "Stores, newest first", body = ApiResponse),
        (status = 503, description = "Storage unavailable", body = ApiResponse)
    )
)]
pub async fn list_stores_handler(
    State(state): State<AppState>,
    Query(query): Query<ListStoresQuery>,
) -> impl IntoResponse {
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
    match state.store_service.list(tag).await {
        Ok(stores) => respond(StatusCode::OK, &stores),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/stores",
    request_body = StoreInput,
    responses(
        (status = 201, description = "Store created", body = ApiResponse),
        (status = 400, description = "Missing or invalid fields", body = ApiResponse),
        (status = 409, description = "No free slug could be assigned", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_store_handler(
    State(state): State<AppState>,
    request: Result<Json<StoreInput>, JsonRejection>,
) -> impl IntoResponse {
    let Json(input) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, STORE_BODY).into_response(),
    };
    match state.store_service.create(input).await {
        Ok(store) => respond(StatusCode::CREATED, &store),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/stores/{id}",
    params(("id" = i64, Path, description = "Store id")),
    responses(
        (status = 200, description = "The store", body = ApiResponse),
        (status = 404, description = "No such store", body = ApiResponse)
    )
)]
pub async fn get_store_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store_service.get(StoreId(id)).await {
        Ok(store) => respond(StatusCode::OK, &store),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/slugs/{slug}",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "The store", body = ApiResponse),
        (status = 404, description = "No such store", body = ApiResponse)
    )
)]
pub async fn get_store_by_slug_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.store_service.get_by_slug(&slug).await {
        Ok(store) => respond(StatusCode::OK, &store),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/api/stores/{id}",
    params(("id" = i64, Path, description = "Store id")),
    request_body = StoreInput,
    responses(
        (status = 200, description = "Store updated", body = ApiResponse),
        (status = 400, description = "Missing or invalid fields", body = ApiResponse),
        (status = 404, description = "No such store", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_store_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    request: Result<Json<StoreInput>, JsonRejection>,
) -> impl IntoResponse {
    let Json(input) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, STORE_BODY).into_response(),
    };
    match state.store_service.update(StoreId(id), input).await {
        Ok(store) => respond(StatusCode::OK, &store),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/stores/{id}",
    params(("id" = i64, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store deleted", body = ApiResponse),
        (status = 404, description = "No such store", body = ApiResponse)
    )
)]
pub async fn delete_store_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store_service.delete(StoreId(id)).await {
        Ok(()) => respond(StatusCode::OK, &serde_json::json!({ "deleted": id })),
        Err(e) => store_error_response(e),
    }
}
