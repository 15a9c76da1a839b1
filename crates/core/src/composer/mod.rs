//! Composer orchestrator.
//!
//! Turns operation requests into jobs, runs each job through the matching
//! engine, stores the produced artifact and waits for its inspection before
//! the job may finish.

mod barrier;
mod config;
mod service;
mod types;

pub use barrier::InspectionBarrier;
pub use config::{ComposerConfig, DispatchMode};
pub use service::ComposerService;
pub use types::{ComposerError, ComposerRequest, ComposerStatus, JobHandle, COMPOSER_JOB_TYPE};
