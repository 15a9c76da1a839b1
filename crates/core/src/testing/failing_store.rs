//! Job store wrapper that fails selected writes.

use std::sync::Arc;

use crate::job::{CreateJobRequest, Job, JobError, JobFilter, JobStatus, JobStore, JobUpdate};

/// Delegates to an inner store but rejects updates to the given statuses
/// with a persistence error.
pub struct FailingJobStore {
    inner: Arc<dyn JobStore>,
    fail_on: Vec<JobStatus>,
}

impl FailingJobStore {
    pub fn new(inner: Arc<dyn JobStore>) -> Self {
        Self {
            inner,
            fail_on: Vec::new(),
        }
    }

    /// Fails every update that would set `status`.
    pub fn fail_on(mut self, status: JobStatus) -> Self {
        self.fail_on.push(status);
        self
    }
}

impl JobStore for FailingJobStore {
    fn create_job(&self, request: CreateJobRequest) -> Result<Job, JobError> {
        self.inner.create_job(request)
    }

    fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job, JobError> {
        if self.fail_on.contains(&update.status()) {
            return Err(JobError::Persistence(format!(
                "simulated failure writing {} for {}",
                update.status(),
                id
            )));
        }
        self.inner.update_job(id, update)
    }

    fn get_job(&self, id: &str) -> Result<Job, JobError> {
        self.inner.get_job(id)
    }

    fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError> {
        self.inner.list_jobs(filter)
    }

    fn count_jobs(&self, filter: &JobFilter) -> Result<usize, JobError> {
        self.inner.count_jobs(filter)
    }
}
