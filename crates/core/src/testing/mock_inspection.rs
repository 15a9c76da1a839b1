//! Mock inspection service for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::inspection::{InspectionError, InspectionService, INSPECTION_JOB_TYPE, INSPECT_OPERATION};
use crate::job::{CreateJobRequest, Job, JobStore, JobUpdate};
use crate::media::{guess_mime_type, Track};

/// How the mock resolves inspection jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InspectionMode {
    /// Finish at once with a track for the location.
    #[default]
    Succeed,
    /// Fail at once.
    Fail,
    /// Leave the job running.
    Never,
}

/// Mock implementation of the InspectionService trait.
///
/// Inspection jobs are recorded in the shared job store like the real
/// service does, but resolved synchronously according to the mode.
pub struct MockInspectionService {
    jobs: Arc<dyn JobStore>,
    mode: InspectionMode,
    inspected: RwLock<Vec<String>>,
}

impl MockInspectionService {
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self {
            jobs,
            mode: InspectionMode::default(),
            inspected: RwLock::new(Vec::new()),
        }
    }

    pub fn with_mode(mut self, mode: InspectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Locations submitted so far.
    pub async fn inspected(&self) -> Vec<String> {
        self.inspected.read().await.clone()
    }

    /// The track a successful inspection reports for a location.
    pub fn verified_track(location: &str) -> Track {
        let mut track = Track::new(location);
        let extension = Path::new(location)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        track.mime_type = guess_mime_type(&extension).map(str::to_string);
        track.size_bytes = Some(0);
        track
    }
}

#[async_trait]
impl InspectionService for MockInspectionService {
    async fn inspect(&self, location: &str) -> Result<Job, InspectionError> {
        self.inspected.write().await.push(location.to_string());

        let job = self.jobs.create_job(
            CreateJobRequest::new(INSPECTION_JOB_TYPE, INSPECT_OPERATION)
                .with_arguments(vec![location.to_string()]),
        )?;
        self.jobs.update_job(&job.id, JobUpdate::running())?;

        match self.mode {
            InspectionMode::Succeed => {
                let payload = serde_json::to_string(&Self::verified_track(location))
                    .map_err(|e| InspectionError::Parse(e.to_string()))?;
                self.jobs.update_job(&job.id, JobUpdate::finished(payload))?;
            }
            InspectionMode::Fail => {
                self.jobs
                    .update_job(&job.id, JobUpdate::failed("mock inspection failure"))?;
            }
            InspectionMode::Never => {}
        }

        Ok(job)
    }
}
