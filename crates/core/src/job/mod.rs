//! Job records and the bookkeeping store that persists them.
//!
//! A job moves `Queued -> Running -> Finished | Failed`. The payload is present
//! if and only if the job is `Finished`; terminal jobs are never mutated.

mod memory_store;
mod store;
mod types;

pub use memory_store::InMemoryJobStore;
pub use store::{CreateJobRequest, JobError, JobFilter, JobStore, JobUpdate};
pub use types::{Job, JobStatus, OperationKind};
