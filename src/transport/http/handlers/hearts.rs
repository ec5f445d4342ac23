use crate::domain::StoreId;
use crate::transport::http::handlers::common::{require_user, respond, store_error_response};
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

#[utoipa::path(
    post,
    path = "/api/stores/{id}/heart",
    params(
        ("id" = i64, Path, description = "Store id"),
        ("x-user-id" = i64, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Heart toggled; returns the new state", body = ApiResponse),
        (status = 401, description = "No authenticated user", body = ApiResponse),
        (status = 404, description = "No such store", body = ApiResponse)
    )
)]
pub async fn toggle_heart_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = match require_user(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match state.store_service.toggle_heart(user, StoreId(id)).await {
        Ok(heart) => respond(StatusCode::OK, &heart),
        Err(e) => store_error_response(e),
    }
}
