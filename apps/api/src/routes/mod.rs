pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation;
use crate::state::AppState;
use crate::versioning;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/portfolio/generate",
            post(generation::handlers::handle_generate),
        )
        .route(
            "/api/v1/portfolio/:slug",
            get(versioning::handlers::handle_get_portfolio)
                .patch(versioning::handlers::handle_edit),
        )
        .route(
            "/api/v1/portfolio/:slug/coaching",
            get(versioning::handlers::handle_get_coaching),
        )
        .route(
            "/api/v1/portfolio/:slug/status",
            get(versioning::handlers::handle_get_status),
        )
        .route(
            "/api/v1/portfolio/:slug/refine",
            post(versioning::handlers::handle_refine),
        )
        .route(
            "/api/v1/portfolio/:slug/confirm",
            post(versioning::handlers::handle_confirm),
        )
        .route(
            "/api/v1/portfolio/:slug/revert",
            post(versioning::handlers::handle_revert),
        )
        .route(
            "/api/v1/portfolio/:slug/versions",
            get(versioning::handlers::handle_list_versions),
        )
        .route(
            "/api/v1/portfolio/:slug/versions/:version_id",
            get(versioning::handlers::handle_get_version),
        )
        .with_state(state)
}
