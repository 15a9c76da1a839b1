pub mod composer;
pub mod config;
pub mod engine;
pub mod inspection;
pub mod job;
pub mod media;
pub mod metrics;
pub mod profile;
pub mod testing;
pub mod workspace;

pub use composer::{
    ComposerConfig, ComposerError, ComposerService, ComposerStatus, DispatchMode, JobHandle,
};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use engine::{CommandEngineFactory, CommandRunner, EngineConfig, EngineError, Listeners};
pub use inspection::{FfprobeInspectionService, InspectionConfig, InspectionService};
pub use job::{InMemoryJobStore, Job, JobStatus, JobStore, OperationKind};
pub use media::{MediaCategory, Track};
pub use profile::{EncodingProfile, ProfileRegistry, StaticProfileRegistry};
pub use workspace::{FsWorkspace, Workspace, WorkspaceConfig};
