use crate::domain::UserId;
use crate::error::{StorageError, StoreError};
use crate::transport::http::types::{ApiResponse, USER_HEADER};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// Wraps `data` in a successful envelope.
pub fn respond<T: Serialize>(status: StatusCode, data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (status, Json(ApiResponse::ok(value))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(format!("Failed to serialize response: {}", e))),
            )
                .into_response()
        }
    }
}

pub fn store_error_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::SlugExhausted { .. } => StatusCode::CONFLICT,
        StoreError::Storage(StorageError::Database(_) | StorageError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps a store error onto the response envelope. Validation failures list every
/// rejected field under `data.fields`.
pub fn store_error_response(err: StoreError) -> Response {
    let status = store_error_status(&err);
    let data = match &err {
        StoreError::Validation(v) => Some(serde_json::json!({ "fields": v.violations })),
        _ => None,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (
        status,
        Json(ApiResponse {
            success: false,
            data,
            error: Some(err.to_string()),
        }),
    )
        .into_response()
}

/// Reads the authenticated user from [`USER_HEADER`].
pub fn require_user(headers: &HeaderMap) -> Result<UserId, Response> {
    let raw = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    match raw.and_then(|v| v.parse::<i64>().ok()) {
        Some(id) => Ok(UserId(id)),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::failure(format!(
                "Missing or invalid '{}' header",
                USER_HEADER
            ))),
        )
            .into_response()),
    }
}
