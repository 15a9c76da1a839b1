//! Job storage trait and request types.

use thiserror::Error;

use super::types::{Job, JobStatus};

/// Errors reported by the bookkeeping store.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job not found.
    #[error("job not found: {0}")]
    NotFound(String),

    /// Store is temporarily unreachable.
    #[error("job store unavailable: {0}")]
    Unavailable(String),

    /// The write could not be persisted.
    #[error("failed to persist job: {0}")]
    Persistence(String),

    /// The requested status change is not allowed.
    #[error("invalid transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Request to allocate a new job.
#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    pub job_type: String,
    pub operation: String,
    pub arguments: Vec<String>,
    pub host: Option<String>,
}

impl CreateJobRequest {
    pub fn new(job_type: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            operation: operation.into(),
            arguments: Vec::new(),
            host: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

/// A status change. Constructors keep the payload/failure fields consistent
/// with the target status.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    status: JobStatus,
    payload: Option<String>,
    failure: Option<String>,
}

impl JobUpdate {
    pub fn running() -> Self {
        Self {
            status: JobStatus::Running,
            payload: None,
            failure: None,
        }
    }

    pub fn finished(payload: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Finished,
            payload: Some(payload.into()),
            failure: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            payload: None,
            failure: Some(reason.into()),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

/// Filter for listing and counting jobs.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub job_type: Option<String>,
    pub status: Option<JobStatus>,
    pub host: Option<String>,
    /// Maximum number of results (0 = unlimited).
    pub limit: usize,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a job satisfies every set criterion.
    pub fn matches(&self, job: &Job) -> bool {
        self.job_type.as_ref().is_none_or(|t| *t == job.job_type)
            && self.status.is_none_or(|s| s == job.status)
            && self
                .host
                .as_ref()
                .is_none_or(|h| job.host.as_deref() == Some(h.as_str()))
    }
}

/// Bookkeeping store that allocates job identifiers and persists status.
///
/// Every call is atomic from the caller's point of view.
pub trait JobStore: Send + Sync {
    /// Allocate a job in `Queued` state.
    fn create_job(&self, request: CreateJobRequest) -> Result<Job, JobError>;

    /// Apply a status change and return the updated job.
    fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job, JobError>;

    /// Get a job by ID.
    fn get_job(&self, id: &str) -> Result<Job, JobError>;

    /// List jobs matching the filter, oldest first.
    fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError>;

    /// Count jobs matching the filter.
    fn count_jobs(&self, filter: &JobFilter) -> Result<usize, JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_constructors() {
        let finished = JobUpdate::finished("{}");
        assert_eq!(finished.status(), JobStatus::Finished);
        assert_eq!(finished.payload(), Some("{}"));
        assert!(finished.failure().is_none());

        let failed = JobUpdate::failed("boom");
        assert_eq!(failed.status(), JobStatus::Failed);
        assert!(failed.payload().is_none());
        assert_eq!(failed.failure(), Some("boom"));
    }

    #[test]
    fn test_error_display() {
        let err = JobError::InvalidTransition {
            id: "job-1".to_string(),
            from: JobStatus::Finished,
            to: JobStatus::Running,
        };
        assert_eq!(
            err.to_string(),
            "invalid transition for job job-1: finished -> running"
        );
    }
}
