//! File system workspace implementation.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;

use super::config::WorkspaceConfig;
use super::error::WorkspaceError;
use super::traits::Workspace;

/// Workspace rooted at a local directory.
pub struct FsWorkspace {
    config: WorkspaceConfig,
}

impl FsWorkspace {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Maps a location onto the root, refusing anything that could escape it.
    fn resolve(&self, location: &str) -> Result<PathBuf, WorkspaceError> {
        let relative = Path::new(location);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if location.is_empty() || escapes {
            return Err(WorkspaceError::not_found(location));
        }
        Ok(self.config.root.join(relative))
    }

    /// Streams `source` into `destination`, returning the number of bytes copied.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        location: &str,
    ) -> Result<u64, WorkspaceError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WorkspaceError::not_found(source.display().to_string())
            } else {
                WorkspaceError::io(location, e)
            }
        })?;

        let dest_file = File::create(destination)
            .await
            .map_err(|e| WorkspaceError::io(location, e))?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .await
                .map_err(|e| WorkspaceError::io(location, e))?;
            if bytes_read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..bytes_read])
                .await
                .map_err(|e| WorkspaceError::io(location, e))?;
            total_bytes += bytes_read as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| WorkspaceError::io(location, e))?;

        Ok(total_bytes)
    }
}

#[async_trait]
impl Workspace for FsWorkspace {
    async fn fetch(&self, location: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.resolve(location)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(WorkspaceError::not_found(location)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(WorkspaceError::not_found(location))
            }
            Err(e) => Err(WorkspaceError::io(location, e)),
        }
    }

    async fn store(
        &self,
        collection: &str,
        name: &str,
        file: &Path,
    ) -> Result<String, WorkspaceError> {
        let location = format!("{}/{}", collection, name);
        let destination = self.resolve(&location)?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| WorkspaceError::io(&location, e))?;
        }

        let bytes = self.copy_file(file, &destination, &location).await?;
        debug!("Stored {} bytes at {}", bytes, location);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> FsWorkspace {
        FsWorkspace::new(WorkspaceConfig::with_root(dir.path().to_path_buf()))
    }

    #[tokio::test]
    async fn test_store_then_fetch() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let local = dir.path().join("produced.mp4");
        fs::write(&local, b"video bytes").await.unwrap();

        let location = ws.store("composer", "job-1.mp4", &local).await.unwrap();
        assert_eq!(location, "composer/job-1.mp4");

        let fetched = ws.fetch(&location).await.unwrap();
        assert_eq!(fs::read(&fetched).await.unwrap(), b"video bytes");
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let err = ws.fetch("media/missing.mp4").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_escape() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        assert!(matches!(
            ws.fetch("../etc/passwd").await,
            Err(WorkspaceError::NotFound { .. })
        ));
        assert!(matches!(
            ws.fetch("/etc/passwd").await,
            Err(WorkspaceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_missing_source() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let err = ws
            .store("composer", "x.mp4", &dir.path().join("nope.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }
}
