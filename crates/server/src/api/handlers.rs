use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use composer_core::job::JobError;
use composer_core::{ComposerError, ComposerStatus};

use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps a composer error onto an HTTP status with a JSON body.
pub fn error_response(err: ComposerError) -> ApiError {
    let status = match &err {
        ComposerError::UnknownProfile(_)
        | ComposerError::Bookkeeping(JobError::NotFound(_)) => StatusCode::NOT_FOUND,
        ComposerError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        ComposerError::AlreadyRunning(_)
        | ComposerError::NotExecutable { .. }
        | ComposerError::Bookkeeping(JobError::InvalidTransition { .. }) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Worker pool and dispatch state of the composer.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ComposerStatus> {
    Json(state.composer().status())
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    metrics::collect_dynamic_metrics(&state);
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                e.to_string(),
            )
        }
    }
}
