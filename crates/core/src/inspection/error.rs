//! Error types for the inspection module.

use std::path::PathBuf;
use thiserror::Error;

use crate::job::JobError;
use crate::workspace::WorkspaceError;

#[derive(Debug, Error)]
pub enum InspectionError {
    /// The inspection job could not be recorded.
    #[error("Job store error: {0}")]
    Job(#[from] JobError),

    /// The artifact could not be fetched.
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("ffprobe not found at {path}")]
    FfprobeNotFound { path: PathBuf },

    #[error("ffprobe failed: {0}")]
    FfprobeFailed(String),

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
