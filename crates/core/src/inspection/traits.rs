//! Inspection service trait.

use async_trait::async_trait;

use crate::job::Job;

use super::error::InspectionError;

/// Job type of inspection jobs in the shared store.
pub const INSPECTION_JOB_TYPE: &str = "inspection";
pub const INSPECT_OPERATION: &str = "inspect";

/// Verifies artifacts in the workspace.
#[async_trait]
pub trait InspectionService: Send + Sync {
    /// Submits an inspection of the artifact at `location` and returns the
    /// inspection job right away. The job later becomes `Finished` with a
    /// serialized track payload, or `Failed`.
    async fn inspect(&self, location: &str) -> Result<Job, InspectionError>;
}
