//! Configuration for the workspace.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the file system workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory that holds every stored collection.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_root() -> PathBuf {
    std::env::temp_dir().join("composer-workspace")
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl WorkspaceConfig {
    /// Creates a config rooted at the given directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkspaceConfig::default();
        assert!(config.root.ends_with("composer-workspace"));
        assert_eq!(config.buffer_size, 8 * 1024 * 1024);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: WorkspaceConfig = toml::from_str(r#"root = "/srv/media""#).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/media"));
        assert_eq!(config.buffer_size, 8 * 1024 * 1024);
    }
}
