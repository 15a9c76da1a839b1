//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary not found.
    #[error("Engine binary not found: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Neither an audio nor a video input was given.
    #[error("No input file given")]
    NoInput,

    /// A parameter or input violates the operation's preconditions.
    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    /// The profile has no command line for this engine.
    #[error("Profile {profile} defines no '{engine}.command'")]
    MissingCommand { profile: String, engine: String },

    /// The external program exited with a non-zero code.
    #[error("{binary} exited with code {code}")]
    NonZeroExit { binary: String, code: i32 },

    /// The program succeeded but the expected output file does not exist.
    #[error("Output file not created: {path}")]
    OutputMissing { path: PathBuf },

    /// The engine does not implement the requested operation.
    #[error("Engine {engine} does not support {operation}")]
    Unsupported { engine: String, operation: String },

    /// I/O error while spawning or supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new invalid parameter error.
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported(engine: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            engine: engine.into(),
            operation: operation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::NonZeroExit {
            binary: "ffmpeg".to_string(),
            code: 1,
        };
        assert_eq!(err.to_string(), "ffmpeg exited with code 1");

        let err = EngineError::MissingCommand {
            profile: "mp4-hd".to_string(),
            engine: "ffmpeg".to_string(),
        };
        assert_eq!(err.to_string(), "Profile mp4-hd defines no 'ffmpeg.command'");
    }
}
