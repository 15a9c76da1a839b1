//! Artifact store ("workspace") that receives and returns media files.
//!
//! Locations are opaque strings handed out by `store` and accepted by `fetch`.
//! The file system implementation uses `collection/name` paths under a root.

mod config;
mod error;
mod fs_workspace;
mod traits;

pub use config::WorkspaceConfig;
pub use error::WorkspaceError;
pub use fs_workspace::FsWorkspace;
pub use traits::Workspace;
