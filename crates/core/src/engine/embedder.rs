//! Caption embedding engine.
//!
//! Validates the media and caption tracks before anything is spawned: the
//! media must carry a video stream and every caption track must carry a
//! `lang:<code>` tag. The caption track geometry is derived from the video
//! frame height.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::profile::EncodingProfile;

use super::error::EngineError;
use super::executor::CommandExecutor;
use super::listener::Listeners;
use super::params::{EngineInputs, ParamMap};
use super::runner::ProcessRunner;
use super::traits::{Engine, LocalTrack};

pub const EMBEDDER_ENGINE: &str = "embedder";

pub const TRACK_HEIGHT: &str = "param.trackh";
pub const TRACK_OFFSET: &str = "param.offset";
pub const CAPTIONS: &str = "param.captions";
pub const LANGUAGES: &str = "param.languages";

const DEFAULT_TRACK_HEIGHT: u32 = 60;
const MAX_TRACK_HEIGHT: u32 = 480;

/// Runs the embedder binary with the profile's `embedder.command`.
pub struct EmbedderEngine {
    executor: CommandExecutor,
}

impl EmbedderEngine {
    pub fn new(binary: impl Into<String>, runner: Arc<dyn ProcessRunner>, listeners: Listeners) -> Self {
        Self {
            executor: CommandExecutor::new(EMBEDDER_ENGINE, binary, runner, listeners),
        }
    }
}

#[async_trait]
impl Engine for EmbedderEngine {
    fn name(&self) -> &str {
        self.executor.engine()
    }

    async fn embed_captions(
        &self,
        media: &LocalTrack,
        captions: &[LocalTrack],
        profile: &EncodingProfile,
        params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        if !media.track.has_video() {
            return Err(EngineError::invalid_parameter(format!(
                "{} has no video stream",
                media.track.location
            )));
        }
        if captions.is_empty() {
            return Err(EngineError::invalid_parameter("no caption tracks given"));
        }
        let languages = caption_languages(captions)?;

        let height = caption_track_height(media.track.frame_height());
        debug!(
            "Caption track height {} for frame height {:?}",
            height,
            media.track.frame_height()
        );

        let mut params = params.clone();
        params.insert(TRACK_HEIGHT.to_string(), height.to_string());
        params.insert(TRACK_OFFSET.to_string(), (height / 2).to_string());
        params.insert(
            CAPTIONS.to_string(),
            captions
                .iter()
                .map(|c| c.path.to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        params.insert(LANGUAGES.to_string(), languages.join(","));
        for (index, (caption, language)) in captions.iter().zip(&languages).enumerate() {
            params.insert(
                format!("in.caption.{}.path", index),
                caption.path.to_string_lossy().to_string(),
            );
            params.insert(format!("in.caption.{}.lang", index), language.clone());
        }

        self.executor
            .execute(EngineInputs::single(&media.path), profile, &params)
            .await
    }
}

/// One eighth of the frame height, 60 when unknown or when the eighth
/// exceeds 480.
pub fn caption_track_height(frame_height: Option<u32>) -> u32 {
    match frame_height {
        Some(height) if height > 0 => {
            let eighth = height / 8;
            if eighth > MAX_TRACK_HEIGHT {
                DEFAULT_TRACK_HEIGHT
            } else {
                eighth
            }
        }
        _ => DEFAULT_TRACK_HEIGHT,
    }
}

/// Language of every caption track, failing on the first one without a tag.
pub fn caption_languages(captions: &[LocalTrack]) -> Result<Vec<String>, EngineError> {
    captions
        .iter()
        .map(|caption| {
            caption
                .track
                .language()
                .map(str::to_string)
                .ok_or_else(|| {
                    EngineError::invalid_parameter(format!(
                        "caption track {} has no lang: tag",
                        caption.track.location
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockProcessRunner};
    use tempfile::TempDir;

    fn caption(dir: &TempDir, name: &str, tags: &[&str]) -> LocalTrack {
        let path = dir.path().join(name);
        std::fs::write(&path, b"WEBVTT").unwrap();
        let mut track = fixtures::track(name);
        track.tags = tags.iter().map(|t| t.to_string()).collect();
        LocalTrack::new(path, track)
    }

    fn media(dir: &TempDir, frame_height: Option<u32>) -> LocalTrack {
        let path = dir.path().join("talk.mp4");
        std::fs::write(&path, b"media").unwrap();
        let mut track = fixtures::video_track("talk.mp4", 1920, 1080, 60_000);
        track.video[0].frame_height = frame_height;
        LocalTrack::new(path, track)
    }

    #[test]
    fn test_caption_track_height() {
        assert_eq!(caption_track_height(Some(1080)), 135);
        assert_eq!(caption_track_height(Some(720)), 90);
        assert_eq!(caption_track_height(Some(3840)), 480);
        assert_eq!(caption_track_height(Some(4320)), 60);
        assert_eq!(caption_track_height(None), 60);
        assert_eq!(caption_track_height(Some(0)), 60);
    }

    #[tokio::test]
    async fn test_embed_injects_geometry_and_languages() {
        let dir = TempDir::new().unwrap();
        let media = media(&dir, Some(1080));
        let captions = vec![
            caption(&dir, "en.vtt", &["public", "lang:en"]),
            caption(&dir, "de.vtt", &["lang:de"]),
        ];
        let runner = Arc::new(MockProcessRunner::new());
        let engine = EmbedderEngine::new("qtembedder", runner.clone(), Listeners::new());

        let output = engine
            .embed_captions(&media, &captions, &fixtures::caption_profile(), &ParamMap::new())
            .await
            .unwrap();

        assert_eq!(output, dir.path().join("talk-captioned.mp4"));
        let argv = &runner.invocations().await[0];
        assert_eq!(argv[0], "qtembedder");
        let trackh = argv.iter().position(|a| a == "-trackh").unwrap();
        assert_eq!(argv[trackh + 1], "135");
        let offset = argv.iter().position(|a| a == "-offset").unwrap();
        assert_eq!(argv[offset + 1], "67");
        let languages = argv.iter().position(|a| a == "-languages").unwrap();
        assert_eq!(argv[languages + 1], "en,de");
    }

    #[tokio::test]
    async fn test_missing_language_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let media = media(&dir, Some(1080));
        let captions = vec![
            caption(&dir, "en.vtt", &["lang:en"]),
            caption(&dir, "x.vtt", &["public"]),
        ];
        let runner = Arc::new(MockProcessRunner::new());
        let engine = EmbedderEngine::new("qtembedder", runner.clone(), Listeners::new());

        let result = engine
            .embed_captions(&media, &captions, &fixtures::caption_profile(), &ParamMap::new())
            .await;

        assert!(matches!(result, Err(EngineError::InvalidParameter { .. })));
        assert_eq!(runner.invocation_count().await, 0);
        assert!(!dir.path().join("talk-captioned.mp4").exists());
    }

    #[tokio::test]
    async fn test_media_without_video() {
        let dir = TempDir::new().unwrap();
        let mut media = media(&dir, Some(1080));
        media.track.video.clear();
        let captions = vec![caption(&dir, "en.vtt", &["lang:en"])];
        let runner = Arc::new(MockProcessRunner::new());
        let engine = EmbedderEngine::new("qtembedder", runner.clone(), Listeners::new());

        let result = engine
            .embed_captions(&media, &captions, &fixtures::caption_profile(), &ParamMap::new())
            .await;

        assert!(matches!(result, Err(EngineError::InvalidParameter { .. })));
        assert_eq!(runner.invocation_count().await, 0);
    }

    #[tokio::test]
    async fn test_encode_is_unsupported() {
        let runner = Arc::new(MockProcessRunner::new());
        let engine = EmbedderEngine::new("qtembedder", runner, Listeners::new());
        let result = engine
            .encode(
                std::path::Path::new("/m.mp4"),
                &fixtures::caption_profile(),
                &ParamMap::new(),
            )
            .await;
        assert!(matches!(result, Err(EngineError::Unsupported { .. })));
    }
}
