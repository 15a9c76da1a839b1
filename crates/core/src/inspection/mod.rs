//! Verification collaborator.
//!
//! An inspection is an independent job in the shared job store. It finishes
//! with a serialized [`Track`](crate::media::Track) describing the verified
//! artifact, or fails with a diagnostic.

mod config;
mod error;
mod ffprobe;
mod traits;

pub use config::{ChecksumType, InspectionConfig};
pub use error::InspectionError;
pub use ffprobe::FfprobeInspectionService;
pub use traits::{InspectionService, INSPECTION_JOB_TYPE, INSPECT_OPERATION};
