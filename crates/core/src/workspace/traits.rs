//! Trait definitions for the workspace module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::WorkspaceError;

/// Durable store for media files.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Returns a local file for the location.
    async fn fetch(&self, location: &str) -> Result<PathBuf, WorkspaceError>;

    /// Copies a local file into the store under `collection/name` and
    /// returns its durable location.
    async fn store(
        &self,
        collection: &str,
        name: &str,
        file: &Path,
    ) -> Result<String, WorkspaceError>;
}
