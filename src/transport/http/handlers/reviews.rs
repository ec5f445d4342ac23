use crate::domain::{ReviewInput, StoreId};
use crate::transport::http::handlers::common::{respond, store_error_response};
use crate::transport::http::types::{json_422, ApiResponse, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/stores/{id}/reviews",
    params(("id" = i64, Path, description = "Store id")),
    responses(
        (status = 200, description = "Reviews of the store, oldest first", body = ApiResponse),
        (status = 404, description = "No such store", body = ApiResponse)
    )
)]
pub async fn list_reviews_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store_service.reviews_for(StoreId(id)).await {
        Ok(reviews) => respond(StatusCode::OK, &reviews),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/stores/{id}/reviews",
    params(("id" = i64, Path, description = "Store id")),
    request_body = ReviewInput,
    responses(
        (status = 201, description = "Review added", body = ApiResponse),
        (status = 400, description = "Missing or invalid fields", body = ApiResponse),
        (status = 404, description = "No such store", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn add_review_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    request: Result<Json<ReviewInput>, JsonRejection>,
) -> impl IntoResponse {
    let Json(input) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"author\": ..., \"rating\": 1-5, \"text\": ...}").into_response()
        }
    };
    match state.store_service.add_review(StoreId(id), input).await {
        Ok(review) => respond(StatusCode::CREATED, &review),
        Err(e) => store_error_response(e),
    }
}
