//! In-memory job store.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::store::{CreateJobRequest, JobError, JobFilter, JobStore, JobUpdate};
use super::types::{Job, JobStatus};

/// Job store backed by a lock-protected map.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> JobError {
        JobError::Unavailable("job store lock poisoned".to_string())
    }
}

impl JobStore for InMemoryJobStore {
    fn create_job(&self, request: CreateJobRequest) -> Result<Job, JobError> {
        let job = Job {
            id: Uuid::new_v4().to_string(),
            job_type: request.job_type,
            operation: request.operation,
            arguments: request.arguments,
            status: JobStatus::Queued,
            payload: None,
            failure: None,
            host: request.host,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };

        let mut jobs = self.jobs.write().map_err(|_| Self::poisoned())?;
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job, JobError> {
        let mut jobs = self.jobs.write().map_err(|_| Self::poisoned())?;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        let next = update.status();
        if !job.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                id: id.to_string(),
                from: job.status,
                to: next,
            });
        }

        let now = Utc::now();
        job.status = next;
        job.payload = update.payload().map(str::to_string);
        job.failure = update.failure().map(str::to_string);
        match next {
            JobStatus::Running => job.started_at = Some(now),
            JobStatus::Finished | JobStatus::Failed => job.completed_at = Some(now),
            JobStatus::Queued => {}
        }

        Ok(job.clone())
    }

    fn get_job(&self, id: &str) -> Result<Job, JobError> {
        let jobs = self.jobs.read().map_err(|_| Self::poisoned())?;
        jobs.get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError> {
        let jobs = self.jobs.read().map_err(|_| Self::poisoned())?;
        let mut matching: Vec<Job> = jobs.values().filter(|j| filter.matches(j)).cloned().collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if filter.limit > 0 {
            matching.truncate(filter.limit);
        }
        Ok(matching)
    }

    fn count_jobs(&self, filter: &JobFilter) -> Result<usize, JobError> {
        let jobs = self.jobs.read().map_err(|_| Self::poisoned())?;
        Ok(jobs.values().filter(|j| filter.matches(j)).count())
    }
}
