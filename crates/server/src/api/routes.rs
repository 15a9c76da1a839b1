use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, profiles};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and status
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        // Profiles
        .route("/profiles", get(profiles::list_profiles))
        .route("/profiles/{id}", get(profiles::get_profile))
        // Job submission
        .route("/jobs/encode", post(jobs::encode))
        .route("/jobs/mux", post(jobs::mux))
        .route("/jobs/trim", post(jobs::trim))
        .route("/jobs/image", post(jobs::image))
        .route("/jobs/captions", post(jobs::captions))
        // Job records
        .route("/jobs/count", get(jobs::count_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}/dispatch", post(jobs::dispatch_job))
        .with_state(Arc::clone(&state));

    // Prometheus scrape endpoint
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(super::middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
