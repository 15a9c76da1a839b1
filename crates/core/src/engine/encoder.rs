//! Transcoder engine: encode, mux and trim.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::profile::EncodingProfile;

use super::error::EngineError;
use super::executor::CommandExecutor;
use super::listener::Listeners;
use super::params::{EngineInputs, ParamMap};
use super::runner::ProcessRunner;
use super::traits::Engine;

pub const ENCODER_ENGINE: &str = "ffmpeg";

pub const TRIM_START: &str = "trim.start";
pub const TRIM_DURATION: &str = "trim.duration";

/// Runs the transcoder binary with the profile's `ffmpeg.command`.
pub struct EncoderEngine {
    executor: CommandExecutor,
}

impl EncoderEngine {
    pub fn new(binary: impl Into<String>, runner: Arc<dyn ProcessRunner>, listeners: Listeners) -> Self {
        Self {
            executor: CommandExecutor::new(ENCODER_ENGINE, binary, runner, listeners),
        }
    }
}

#[async_trait]
impl Engine for EncoderEngine {
    fn name(&self) -> &str {
        self.executor.engine()
    }

    async fn encode(
        &self,
        input: &Path,
        profile: &EncodingProfile,
        params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        self.executor
            .execute(EngineInputs::single(input), profile, params)
            .await
    }

    async fn mux(
        &self,
        audio: &Path,
        video: &Path,
        profile: &EncodingProfile,
        params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        self.executor
            .execute(EngineInputs::muxed(audio, video), profile, params)
            .await
    }

    async fn trim(
        &self,
        input: &Path,
        profile: &EncodingProfile,
        start_ms: u64,
        duration_ms: u64,
        params: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        let mut params = params.clone();
        params.insert(TRIM_START.to_string(), format_seconds(start_ms));
        params.insert(TRIM_DURATION.to_string(), format_seconds(duration_ms));

        self.executor
            .execute(EngineInputs::single(input), profile, &params)
            .await
    }
}

/// Milliseconds as seconds with millisecond precision, e.g. `5.250`.
pub fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, EngineListener};
    use crate::testing::{fixtures, MockProcessRunner};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        produced: Mutex<Vec<EngineEvent>>,
        failed: Mutex<Vec<EngineEvent>>,
    }

    impl EngineListener for Recorder {
        fn on_produced(&self, event: &EngineEvent) {
            self.produced.lock().unwrap().push(event.clone());
        }

        fn on_failed(&self, event: &EngineEvent) {
            self.failed.lock().unwrap().push(event.clone());
        }
    }

    fn engine(runner: Arc<MockProcessRunner>, recorder: Arc<Recorder>) -> EncoderEngine {
        let mut listeners = Listeners::new();
        listeners.add(recorder);
        EncoderEngine::new("/usr/bin/ffmpeg", runner, listeners)
    }

    fn input(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"media").unwrap();
        path
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "0.000");
        assert_eq!(format_seconds(5250), "5.250");
        assert_eq!(format_seconds(61_007), "61.007");
    }

    #[tokio::test]
    async fn test_encode_builds_argv_and_produces() {
        let dir = TempDir::new().unwrap();
        let source = input(&dir, "lecture.mov");
        let runner = Arc::new(MockProcessRunner::new());
        let recorder = Arc::new(Recorder::default());
        let engine = engine(runner.clone(), recorder.clone());

        let output = engine
            .encode(&source, &fixtures::mp4_profile(), &ParamMap::new())
            .await
            .unwrap();

        assert_eq!(output, dir.path().join("lecture.mp4"));
        assert!(output.exists());

        let invocations = runner.invocations().await;
        assert_eq!(invocations.len(), 1);
        let argv = &invocations[0];
        assert_eq!(argv[0], "/usr/bin/ffmpeg");
        assert!(argv.contains(&source.to_string_lossy().to_string()));
        assert_eq!(argv.last().unwrap(), &output.to_string_lossy().to_string());

        let produced = recorder.produced.lock().unwrap();
        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].profile_id, "mp4-hd");
        assert_eq!(produced[0].sources, vec![source]);
    }

    #[tokio::test]
    async fn test_mux_names_output_after_video() {
        let dir = TempDir::new().unwrap();
        let audio = input(&dir, "voice.m4a");
        let video = input(&dir, "screen.mov");
        let runner = Arc::new(MockProcessRunner::new());
        let engine = engine(runner.clone(), Arc::new(Recorder::default()));

        let output = engine
            .mux(&audio, &video, &fixtures::mux_profile(), &ParamMap::new())
            .await
            .unwrap();

        assert_eq!(output, dir.path().join("screen.mkv"));
        let argv = &runner.invocations().await[0];
        assert!(argv.contains(&audio.to_string_lossy().to_string()));
        assert!(argv.contains(&video.to_string_lossy().to_string()));
    }

    #[tokio::test]
    async fn test_trim_injects_bounds() {
        let dir = TempDir::new().unwrap();
        let source = input(&dir, "talk.mp4");
        let runner = Arc::new(MockProcessRunner::new());
        let engine = engine(runner.clone(), Arc::new(Recorder::default()));

        let output = engine
            .trim(&source, &fixtures::trim_profile(), 1500, 60_000, &ParamMap::new())
            .await
            .unwrap();

        assert_eq!(output, dir.path().join("talk-trimmed.mp4"));
        let argv = &runner.invocations().await[0];
        let ss = argv.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(argv[ss + 1], "1.500");
        let t = argv.iter().position(|a| a == "-t").unwrap();
        assert_eq!(argv[t + 1], "60.000");
    }

    #[tokio::test]
    async fn test_non_zero_exit_fires_failed() {
        let dir = TempDir::new().unwrap();
        let source = input(&dir, "lecture.mov");
        let runner = Arc::new(MockProcessRunner::new().with_exit_code(1));
        let recorder = Arc::new(Recorder::default());
        let engine = engine(runner, recorder.clone());

        let result = engine
            .encode(&source, &fixtures::mp4_profile(), &ParamMap::new())
            .await;

        assert!(matches!(result, Err(EngineError::NonZeroExit { code: 1, .. })));
        assert_eq!(recorder.failed.lock().unwrap().len(), 1);
        assert!(recorder.produced.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_is_failure() {
        let dir = TempDir::new().unwrap();
        let source = input(&dir, "lecture.mov");
        let runner = Arc::new(MockProcessRunner::new().without_output());
        let recorder = Arc::new(Recorder::default());
        let engine = engine(runner, recorder.clone());

        let result = engine
            .encode(&source, &fixtures::mp4_profile(), &ParamMap::new())
            .await;

        assert!(matches!(result, Err(EngineError::OutputMissing { .. })));
        assert_eq!(recorder.failed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite_input() {
        let dir = TempDir::new().unwrap();
        let source = input(&dir, "lecture.mp4");
        let runner = Arc::new(MockProcessRunner::new());
        let engine = engine(runner.clone(), Arc::new(Recorder::default()));

        let result = engine
            .encode(&source, &fixtures::mp4_profile(), &ParamMap::new())
            .await;

        assert!(matches!(result, Err(EngineError::InvalidParameter { .. })));
        assert_eq!(runner.invocation_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_command() {
        let dir = TempDir::new().unwrap();
        let source = input(&dir, "lecture.mov");
        let mut profile = fixtures::mp4_profile();
        profile.extension.clear();
        let runner = Arc::new(MockProcessRunner::new());
        let engine = engine(runner.clone(), Arc::new(Recorder::default()));

        let result = engine.encode(&source, &profile, &ParamMap::new()).await;

        assert!(matches!(result, Err(EngineError::MissingCommand { .. })));
        assert_eq!(runner.invocation_count().await, 0);
    }

    #[tokio::test]
    async fn test_embed_is_unsupported() {
        let runner = Arc::new(MockProcessRunner::new());
        let engine = engine(runner, Arc::new(Recorder::default()));
        let media = crate::engine::LocalTrack::new("/m.mp4", crate::media::Track::new("m.mp4"));

        let result = engine
            .embed_captions(&media, &[], &fixtures::mp4_profile(), &ParamMap::new())
            .await;

        assert!(matches!(result, Err(EngineError::Unsupported { .. })));
    }
}
