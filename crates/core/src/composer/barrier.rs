//! Waits for an inspection job before a composer job may finish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::inspection::InspectionService;
use crate::job::{Job, JobStatus, JobStore};
use crate::media::Track;
use crate::metrics;

use super::types::ComposerError;

/// Submits an inspection and polls the job store until it is terminal.
pub struct InspectionBarrier {
    inspection: Arc<dyn InspectionService>,
    jobs: Arc<dyn JobStore>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl InspectionBarrier {
    pub fn new(
        inspection: Arc<dyn InspectionService>,
        jobs: Arc<dyn JobStore>,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            inspection,
            jobs,
            poll_interval,
            timeout,
        }
    }

    /// Returns the verified track for `location`.
    ///
    /// Fails when the inspection fails, when the timeout elapses or when
    /// `cancel` fires. The inspection job itself keeps running in the last
    /// two cases.
    pub async fn verify(
        &self,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<Track, ComposerError> {
        let job = self
            .inspection
            .inspect(location)
            .await
            .map_err(|e| ComposerError::VerificationFailed(e.to_string()))?;
        info!("Waiting for inspection {} of {}", job.id, location);

        let started = Instant::now();
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ComposerError::VerificationFailed(format!(
                "interrupted while waiting for inspection {}",
                job.id
            ))),
            result = self.wait_bounded(&job.id) => result,
        };
        metrics::INSPECTION_WAIT.observe(started.elapsed().as_secs_f64());

        let job = result?;
        match job.status {
            JobStatus::Finished => {
                let payload = job.payload.as_deref().ok_or_else(|| {
                    ComposerError::VerificationFailed(format!(
                        "inspection {} finished without a result",
                        job.id
                    ))
                })?;
                serde_json::from_str(payload).map_err(|e| {
                    ComposerError::VerificationFailed(format!(
                        "inspection {} result unreadable: {}",
                        job.id, e
                    ))
                })
            }
            _ => Err(ComposerError::VerificationFailed(
                job.failure
                    .unwrap_or_else(|| format!("inspection {} failed", job.id)),
            )),
        }
    }

    async fn wait_bounded(&self, id: &str) -> Result<Job, ComposerError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.wait_terminal(id))
                .await
                .map_err(|_| {
                    ComposerError::VerificationFailed(format!(
                        "inspection {} did not finish within {:?}",
                        id, limit
                    ))
                })?,
            None => self.wait_terminal(id).await,
        }
    }

    async fn wait_terminal(&self, id: &str) -> Result<Job, ComposerError> {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            let job = self.jobs.get_job(id)?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            debug!("Inspection {} is {}", id, job.status);
        }
    }
}
