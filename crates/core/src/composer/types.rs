//! Types for the composer service.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::engine::EngineError;
use crate::job::{Job, JobError, OperationKind};
use crate::media::Track;

use super::config::DispatchMode;

/// Job type of composer jobs in the shared store.
pub const COMPOSER_JOB_TYPE: &str = "composer";

/// Errors that abort a composer job.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// A referenced input does not exist in the workspace.
    #[error("input not found: {0}")]
    InputNotFound(String),

    /// A referenced input exists but could not be read.
    #[error("failed to read input {location}: {reason}")]
    InputIo { location: String, reason: String },

    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error("no engine available for profile {0}")]
    NoEngineForProfile(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{binary} exited with code {code}")]
    SubprocessNonZeroExit { binary: String, code: i32 },

    /// The produced artifact could not be stored.
    #[error("artifact store error: {0}")]
    ArtifactStore(String),

    /// Inspection failed, timed out or was interrupted.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("job store error: {0}")]
    Bookkeeping(#[from] JobError),

    /// Another execution routine is active for the job.
    #[error("job {0} is already running")]
    AlreadyRunning(String),

    /// The job is not a queued composer job.
    #[error("job {id} cannot be executed: {reason}")]
    NotExecutable { id: String, reason: String },

    /// The job was submitted for external dispatch and has no completion handle.
    #[error("job {0} is waiting for external dispatch")]
    NotDispatched(String),

    #[error("engine error: {0}")]
    Engine(EngineError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ComposerError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidParameter { reason } => ComposerError::InvalidParameter(reason),
            EngineError::NoInput => ComposerError::InvalidParameter("no input file given".to_string()),
            EngineError::NonZeroExit { binary, code } => {
                ComposerError::SubprocessNonZeroExit { binary, code }
            }
            other => ComposerError::Engine(other),
        }
    }
}

/// One composer operation with its inputs.
///
/// Stored on the job as an argument list so that any worker, including an
/// external scheduler, can execute the job from its record alone.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerRequest {
    Encode {
        track: Track,
        profile_id: String,
    },
    Mux {
        video: Track,
        audio: Track,
        profile_id: String,
    },
    Trim {
        track: Track,
        profile_id: String,
        start_ms: u64,
        duration_ms: u64,
    },
    ExtractImage {
        track: Track,
        profile_id: String,
        time_ms: i64,
    },
    EmbedCaptions {
        media: Track,
        captions: Vec<Track>,
        profile_id: String,
    },
}

impl ComposerRequest {
    pub fn operation(&self) -> OperationKind {
        match self {
            ComposerRequest::Encode { .. } => OperationKind::Encode,
            ComposerRequest::Mux { .. } => OperationKind::Mux,
            ComposerRequest::Trim { .. } => OperationKind::Trim,
            ComposerRequest::ExtractImage { .. } => OperationKind::ExtractImage,
            ComposerRequest::EmbedCaptions { .. } => OperationKind::EmbedCaptions,
        }
    }

    pub fn profile_id(&self) -> &str {
        match self {
            ComposerRequest::Encode { profile_id, .. }
            | ComposerRequest::Mux { profile_id, .. }
            | ComposerRequest::Trim { profile_id, .. }
            | ComposerRequest::ExtractImage { profile_id, .. }
            | ComposerRequest::EmbedCaptions { profile_id, .. } => profile_id,
        }
    }

    /// Serializes the request into job arguments.
    pub fn to_arguments(&self) -> Result<Vec<String>, ComposerError> {
        let args = match self {
            ComposerRequest::Encode { track, profile_id } => {
                vec![to_json(track)?, profile_id.clone()]
            }
            ComposerRequest::Mux {
                video,
                audio,
                profile_id,
            } => vec![to_json(video)?, to_json(audio)?, profile_id.clone()],
            ComposerRequest::Trim {
                track,
                profile_id,
                start_ms,
                duration_ms,
            } => vec![
                to_json(track)?,
                profile_id.clone(),
                start_ms.to_string(),
                duration_ms.to_string(),
            ],
            ComposerRequest::ExtractImage {
                track,
                profile_id,
                time_ms,
            } => vec![to_json(track)?, profile_id.clone(), time_ms.to_string()],
            ComposerRequest::EmbedCaptions {
                media,
                captions,
                profile_id,
            } => vec![to_json(media)?, to_json(captions)?, profile_id.clone()],
        };
        Ok(args)
    }

    /// Reads the request back from a job record.
    pub fn from_job(job: &Job) -> Result<Self, ComposerError> {
        let operation: OperationKind = job
            .operation
            .parse()
            .map_err(ComposerError::InvalidParameter)?;
        let args = Arguments(&job.arguments);

        let request = match operation {
            OperationKind::Encode => ComposerRequest::Encode {
                track: args.json(0)?,
                profile_id: args.text(1)?,
            },
            OperationKind::Mux => ComposerRequest::Mux {
                video: args.json(0)?,
                audio: args.json(1)?,
                profile_id: args.text(2)?,
            },
            OperationKind::Trim => ComposerRequest::Trim {
                track: args.json(0)?,
                profile_id: args.text(1)?,
                start_ms: args.number(2)?,
                duration_ms: args.number(3)?,
            },
            OperationKind::ExtractImage => ComposerRequest::ExtractImage {
                track: args.json(0)?,
                profile_id: args.text(1)?,
                time_ms: args.number(2)?,
            },
            OperationKind::EmbedCaptions => ComposerRequest::EmbedCaptions {
                media: args.json(0)?,
                captions: args.json(1)?,
                profile_id: args.text(2)?,
            },
        };
        Ok(request)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ComposerError> {
    serde_json::to_string(value).map_err(|e| ComposerError::Internal(e.to_string()))
}

struct Arguments<'a>(&'a [String]);

impl Arguments<'_> {
    fn get(&self, index: usize) -> Result<&str, ComposerError> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| ComposerError::InvalidParameter(format!("missing argument {}", index)))
    }

    fn text(&self, index: usize) -> Result<String, ComposerError> {
        self.get(index).map(str::to_string)
    }

    fn json<T: for<'de> Deserialize<'de>>(&self, index: usize) -> Result<T, ComposerError> {
        serde_json::from_str(self.get(index)?).map_err(|e| {
            ComposerError::InvalidParameter(format!("argument {}: {}", index, e))
        })
    }

    fn number<T: std::str::FromStr>(&self, index: usize) -> Result<T, ComposerError> {
        let raw = self.get(index)?;
        raw.parse().map_err(|_| {
            ComposerError::InvalidParameter(format!("argument {} is not a number: {}", index, raw))
        })
    }
}

/// A submitted job plus, in pool mode, the handle of its execution.
#[derive(Debug)]
pub struct JobHandle {
    job: Job,
    completion: Option<JoinHandle<Result<Job, ComposerError>>>,
}

impl JobHandle {
    pub(crate) fn new(job: Job, completion: Option<JoinHandle<Result<Job, ComposerError>>>) -> Self {
        Self { job, completion }
    }

    /// The job as recorded at submission.
    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn id(&self) -> &str {
        &self.job.id
    }

    /// Returns the job record without waiting.
    pub fn into_job(self) -> Job {
        self.job
    }

    /// Waits for the execution to end and returns the finished job or the
    /// failure that aborted it. Dropping the handle instead does not stop
    /// the execution.
    pub async fn wait(self) -> Result<Job, ComposerError> {
        match self.completion {
            Some(handle) => handle
                .await
                .map_err(|e| ComposerError::Internal(format!("worker task failed: {}", e)))?,
            None => Err(ComposerError::NotDispatched(self.job.id)),
        }
    }
}

/// Current state of the composer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerStatus {
    pub dispatch: DispatchMode,
    pub max_workers: usize,
    /// Idle worker slots (pool mode).
    pub available_workers: usize,
    /// Jobs whose execution routine is running.
    pub active_jobs: Vec<String>,
    pub shutting_down: bool,
}
