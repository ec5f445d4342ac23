use crate::transport::http::handlers::common::{respond, store_error_response};
use crate::transport::http::types::{ApiResponse, AppState, SearchQuery};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "Tags with occurrence counts, most used first", body = ApiResponse),
        (status = 503, description = "Storage unavailable", body = ApiResponse)
    )
)]
pub async fn tags_list_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store_service.tags_list().await {
        Ok(tags) => respond(StatusCode::OK, &tags),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/top",
    responses(
        (status = 200, description = "Best rated stores with two or more reviews", body = ApiResponse),
        (status = 503, description = "Storage unavailable", body = ApiResponse)
    )
)]
pub async fn top_stores_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store_service.top_stores().await {
        Ok(top) => respond(StatusCode::OK, &top),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching stores, best first", body = ApiResponse),
        (status = 503, description = "Storage unavailable", body = ApiResponse)
    )
)]
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    match state.store_service.search(&query.q).await {
        Ok(stores) => respond(StatusCode::OK, &stores),
        Err(e) => store_error_response(e),
    }
}
