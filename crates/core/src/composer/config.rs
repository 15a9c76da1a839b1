//! Composer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who runs the execution routine of a submitted job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Jobs run on the composer's own bounded worker pool.
    #[default]
    Pool,
    /// Jobs stay queued until an external scheduler calls `process`.
    External,
}

/// Configuration for the composer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Jobs that may execute at the same time in pool mode (minimum 1).
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default)]
    pub dispatch: DispatchMode,

    /// Workspace collection that receives produced artifacts.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Host recorded on every composer job.
    #[serde(default = "default_host")]
    pub host: String,

    /// Profile used for caption embedding.
    #[serde(default = "default_caption_profile")]
    pub caption_profile: String,

    /// How often to re-check a pending inspection (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub inspection_poll_interval_ms: u64,

    /// Upper bound on the inspection wait (seconds, 0 = wait forever).
    #[serde(default = "default_inspection_timeout")]
    pub inspection_timeout_secs: u64,
}

fn default_max_workers() -> usize {
    4
}

fn default_collection() -> String {
    "composer".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_caption_profile() -> String {
    "captions-embed".to_string()
}

fn default_poll_interval() -> u64 {
    5000 // 5 seconds
}

fn default_inspection_timeout() -> u64 {
    3600 // 1 hour
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            dispatch: DispatchMode::default(),
            collection: default_collection(),
            host: default_host(),
            caption_profile: default_caption_profile(),
            inspection_poll_interval_ms: default_poll_interval(),
            inspection_timeout_secs: default_inspection_timeout(),
        }
    }
}

impl ComposerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.inspection_poll_interval_ms)
    }

    /// `None` when the wait is unbounded.
    pub fn inspection_timeout(&self) -> Option<Duration> {
        (self.inspection_timeout_secs > 0).then(|| Duration::from_secs(self.inspection_timeout_secs))
    }
}
