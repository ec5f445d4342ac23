use crate::domain::{
    HeartState, Location, LocationInput, Review, ReviewId, ReviewInput, Store, StoreId,
    StoreInput, TagCount, TopStore, UserId,
};
use crate::error::FieldViolation;
use crate::transport::http::handlers::{aggregates, health, hearts, reviews, stores};
use crate::transport::http::types::ApiResponse;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        stores::list_stores_handler,
        stores::create_store_handler,
        stores::get_store_handler,
        stores::get_store_by_slug_handler,
        stores::update_store_handler,
        stores::delete_store_handler,
        reviews::list_reviews_handler,
        reviews::add_review_handler,
        hearts::toggle_heart_handler,
        aggregates::tags_list_handler,
        aggregates::top_stores_handler,
        aggregates::search_handler
    ),
    components(schemas(
        ApiResponse,
        FieldViolation,
        Store,
        StoreId,
        UserId,
        Location,
        StoreInput,
        LocationInput,
        Review,
        ReviewId,
        ReviewInput,
        TagCount,
        TopStore,
        HeartState
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/api/stores",
            get(stores::list_stores_handler).post(stores::create_store_handler),
        )
        .route(
            "/api/stores/:id",
            get(stores::get_store_handler)
                .put(stores::update_store_handler)
                .delete(stores::delete_store_handler),
        )
        .route(
            "/api/stores/:id/reviews",
            get(reviews::list_reviews_handler).post(reviews::add_review_handler),
        )
        .route("/api/stores/:id/heart", post(hearts::toggle_heart_handler))
        .route("/api/slugs/:slug", get(stores::get_store_by_slug_handler))
        .route("/api/tags", get(aggregates::tags_list_handler))
        .route("/api/top", get(aggregates::top_stores_handler))
        .route("/api/search", get(aggregates::search_handler))
        .with_state(app_state)
}
