//! Configuration for the inspection service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Checksum algorithm recorded on inspected tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumType {
    #[default]
    Sha256,
    /// Faster but weaker.
    Md5,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionConfig {
    /// Path to the ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    #[serde(default)]
    pub checksum: ChecksumType,

    /// Inspections that may run at the same time.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Read buffer for checksum calculation.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_max_parallel() -> usize {
    2
}

fn default_buffer_size() -> usize {
    64 * 1024
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: default_ffprobe_path(),
            checksum: ChecksumType::default(),
            max_parallel: default_max_parallel(),
            buffer_size: default_buffer_size(),
        }
    }
}
