pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dashboard;
use crate::ingest::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate bulk-upload flow
        .route("/api/v1/candidates/ingest", post(handlers::handle_ingest))
        .route(
            "/api/v1/candidates/ingest/:id",
            get(handlers::handle_get_session),
        )
        .route(
            "/api/v1/candidates/ingest/:id/confirm",
            post(handlers::handle_confirm),
        )
        // Dashboard analytics
        .route(
            "/api/v1/dashboard/uploads",
            get(dashboard::handle_upload_stats),
        )
        .route(
            "/api/v1/dashboard/recent",
            get(dashboard::handle_recent_uploads),
        )
        .with_state(state)
}
