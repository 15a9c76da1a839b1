//! Encoding profiles and the registry that serves them.
//!
//! Profiles are immutable once loaded. The registry hands out `Arc` snapshots,
//! so callers share a profile but never mutate it.

mod registry;
mod types;

pub use registry::{ProfileRegistry, StaticProfileRegistry};
pub use types::EncodingProfile;
