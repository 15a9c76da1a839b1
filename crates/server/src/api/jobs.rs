//! Job API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use composer_core::{ComposerError, DispatchMode, Job, JobStatus, Track};

use super::handlers::{error_response, ApiError, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for encoding a track
#[derive(Debug, Deserialize)]
pub struct EncodeBody {
    pub track: Track,
    pub profile_id: String,
}

/// Request body for muxing a video and an audio track
#[derive(Debug, Deserialize)]
pub struct MuxBody {
    pub video: Track,
    pub audio: Track,
    pub profile_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TrimBody {
    pub track: Track,
    pub profile_id: String,
    pub start_ms: u64,
    pub duration_ms: u64,
}

/// Request body for extracting a still image
#[derive(Debug, Deserialize)]
pub struct ImageBody {
    pub track: Track,
    pub profile_id: String,
    /// Position in the source, in milliseconds
    pub time_ms: i64,
}

/// Request body for embedding caption tracks
#[derive(Debug, Deserialize)]
pub struct CaptionsBody {
    pub track: Track,
    pub captions: Vec<Track>,
}

/// Query parameters for counting jobs
#[derive(Debug, Deserialize)]
pub struct CountJobsParams {
    pub status: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountJobsResponse {
    pub count: usize,
}

/// Response for job operations
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub job_type: String,
    pub operation: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        // Payloads are serialized tracks; anything else is passed through as text.
        let payload = job.payload.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        });
        Self {
            id: job.id,
            job_type: job.job_type,
            operation: job.operation,
            status: job.status,
            payload,
            failure: job.failure,
            host: job.host,
            created_at: job.created_at.to_rfc3339(),
            started_at: job.started_at.map(|t| t.to_rfc3339()),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

type Accepted = (StatusCode, Json<JobResponse>);

fn accepted(job: Job) -> Accepted {
    info!("Accepted {} job {}", job.operation, job.id);
    (StatusCode::ACCEPTED, Json(JobResponse::from(job)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit an encode job
pub async fn encode(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EncodeBody>,
) -> Result<Accepted, ApiError> {
    let handle = state
        .composer()
        .request_encode(body.track, &body.profile_id)
        .await
        .map_err(error_response)?;
    Ok(accepted(handle.into_job()))
}

/// Submit a mux job
pub async fn mux(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MuxBody>,
) -> Result<Accepted, ApiError> {
    let handle = state
        .composer()
        .request_mux(body.video, body.audio, &body.profile_id)
        .await
        .map_err(error_response)?;
    Ok(accepted(handle.into_job()))
}

pub async fn trim(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrimBody>,
) -> Result<Accepted, ApiError> {
    let handle = state
        .composer()
        .request_trim(body.track, &body.profile_id, body.start_ms, body.duration_ms)
        .await
        .map_err(error_response)?;
    Ok(accepted(handle.into_job()))
}

/// Submit a still image extraction job
pub async fn image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImageBody>,
) -> Result<Accepted, ApiError> {
    let handle = state
        .composer()
        .request_image(body.track, &body.profile_id, body.time_ms)
        .await
        .map_err(error_response)?;
    Ok(accepted(handle.into_job()))
}

/// Submit a caption embedding job
pub async fn captions(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CaptionsBody>,
) -> Result<Accepted, ApiError> {
    let handle = state
        .composer()
        .request_caption_embed(body.track, body.captions)
        .await
        .map_err(error_response)?;
    Ok(accepted(handle.into_job()))
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    state
        .composer()
        .get_job(&id)
        .map(|job| Json(JobResponse::from(job)))
        .map_err(error_response)
}

/// Count composer jobs with optional filters
pub async fn count_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountJobsParams>,
) -> Result<Json<CountJobsResponse>, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<JobStatus>)
        .transpose()
        .map_err(|error| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })))?;

    let count = state
        .composer()
        .count_jobs(status, params.host.as_deref())
        .map_err(error_response)?;
    Ok(Json(CountJobsResponse { count }))
}

/// Run the execution routine of a queued job and return it once terminal.
///
/// Only available in external dispatch mode. A job that fails while
/// executing is returned with status `failed`; errors are reserved for jobs
/// that could not be started.
pub async fn dispatch_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let composer = state.composer();
    if composer.config().dispatch == DispatchMode::Pool {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "jobs are dispatched by the worker pool".to_string(),
            }),
        ));
    }

    match composer.process(&id).await {
        Ok(job) => Ok(Json(JobResponse::from(job))),
        Err(
            e @ (ComposerError::AlreadyRunning(_)
            | ComposerError::NotExecutable { .. }
            | ComposerError::Bookkeeping(_)),
        ) => Err(error_response(e)),
        Err(e) => match composer.get_job(&id) {
            Ok(job) if job.status.is_terminal() => Ok(Json(JobResponse::from(job))),
            _ => Err(error_response(e)),
        },
    }
}
