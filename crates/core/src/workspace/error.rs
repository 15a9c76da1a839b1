//! Error types for the workspace module.

use thiserror::Error;

/// Errors that can occur while reading or writing the workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Nothing is stored at the location.
    #[error("Location not found: {location}")]
    NotFound { location: String },

    /// Reading or writing failed.
    #[error("I/O error at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound {
            location: location.into(),
        }
    }

    pub fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            location: location.into(),
            source,
        }
    }
}
