//! Engine trait definition.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::media::Track;
use crate::profile::EncodingProfile;

use super::error::EngineError;
use super::params::ParamMap;

/// A fetched track: the local file plus what is known about it.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    pub path: PathBuf,
    pub track: Track,
}

impl LocalTrack {
    pub fn new(path: impl Into<PathBuf>, track: Track) -> Self {
        Self {
            path: path.into(),
            track,
        }
    }
}

/// Turns inputs and a profile into a produced local file by running an
/// external program.
///
/// Operations an engine cannot perform return [`EngineError::Unsupported`].
#[async_trait]
pub trait Engine: Send + Sync {
    /// Name used to pick the profile command (`<name>.command`).
    fn name(&self) -> &str;

    /// Encodes a single input.
    async fn encode(
        &self,
        _input: &Path,
        _profile: &EncodingProfile,
        _params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        Err(EngineError::unsupported(self.name(), "encode"))
    }

    /// Encodes an audio and a video input into one output.
    async fn mux(
        &self,
        _audio: &Path,
        _video: &Path,
        _profile: &EncodingProfile,
        _params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        Err(EngineError::unsupported(self.name(), "mux"))
    }

    /// Cuts `duration_ms` starting at `start_ms` out of the input.
    async fn trim(
        &self,
        _input: &Path,
        _profile: &EncodingProfile,
        _start_ms: u64,
        _duration_ms: u64,
        _params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        Err(EngineError::unsupported(self.name(), "trim"))
    }

    /// Embeds caption tracks into the media track.
    async fn embed_captions(
        &self,
        _media: &LocalTrack,
        _captions: &[LocalTrack],
        _profile: &EncodingProfile,
        _params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        Err(EngineError::unsupported(self.name(), "embed_captions"))
    }
}
