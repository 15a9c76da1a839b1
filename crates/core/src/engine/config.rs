//! Configuration for the engines.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Binaries and process settings for the command line engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the transcoder binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to the caption embedding binary.
    #[serde(default = "default_embedder_path")]
    pub embedder_path: PathBuf,

    /// Working directory for spawned processes. Defaults to the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_embedder_path() -> PathBuf {
    PathBuf::from("qtembedder")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            embedder_path: default_embedder_path(),
            working_dir: None,
        }
    }
}

impl EngineConfig {
    /// Creates a new config with custom binary paths.
    pub fn with_paths(ffmpeg_path: PathBuf, embedder_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            embedder_path,
            ..Default::default()
        }
    }

    /// Sets the working directory for spawned processes.
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.embedder_path, PathBuf::from("qtembedder"));
        assert!(config.working_dir.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::with_paths(
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/opt/embed"),
        )
        .with_working_dir(PathBuf::from("/tmp/work"));

        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.embedder_path, PathBuf::from("/opt/embed"));
        assert_eq!(config.working_dir, Some(PathBuf::from("/tmp/work")));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig = toml::from_str(r#"ffmpeg_path = "/bin/ffmpeg""#).unwrap();
        assert_eq!(config.ffmpeg_path, PathBuf::from("/bin/ffmpeg"));
        assert_eq!(config.embedder_path, PathBuf::from("qtembedder"));
    }
}
