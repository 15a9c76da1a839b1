//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the composer's collaborator
//! traits, allowing end-to-end tests without real binaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use composer_core::testing::{fixtures, ComposerHarness};
//!
//! let harness = ComposerHarness::builder(dir.path()).build();
//! harness.stage("media/lecture.mov").await?;
//!
//! let handle = harness
//!     .service
//!     .request_encode(fixtures::video_track("media/lecture.mov", 1920, 1080, 60_000), "mp4-hd")
//!     .await?;
//! let job = handle.wait().await?;
//! ```

mod failing_store;
mod harness;
mod mock_inspection;
mod mock_runner;

pub use failing_store::FailingJobStore;
pub use harness::{ComposerHarness, ComposerHarnessBuilder};
pub use mock_inspection::{InspectionMode, MockInspectionService};
pub use mock_runner::MockProcessRunner;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::HashMap;

    use crate::media::{guess_mime_type, AudioStream, MediaCategory, Track, VideoStream};
    use crate::profile::EncodingProfile;

    fn mime_for(location: &str) -> Option<String> {
        let extension = location.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        guess_mime_type(extension).map(str::to_string)
    }

    /// A track with only a location and a guessed mime type.
    pub fn track(location: &str) -> Track {
        let mut track = Track::new(location);
        track.mime_type = mime_for(location);
        track
    }

    /// A video-only track.
    pub fn video_track(location: &str, width: u32, height: u32, duration_ms: u64) -> Track {
        let mut track = track(location);
        track.duration_ms = Some(duration_ms);
        track.video.push(VideoStream {
            codec: Some("h264".to_string()),
            frame_width: Some(width),
            frame_height: Some(height),
            frame_rate: Some(25.0),
        });
        track
    }

    /// An audio-only track.
    pub fn audio_track(location: &str, duration_ms: u64) -> Track {
        let mut track = track(location);
        track.duration_ms = Some(duration_ms);
        track.audio.push(AudioStream {
            codec: Some("aac".to_string()),
            channels: Some(2),
            sample_rate: Some(48000),
            bitrate_kbps: Some(128),
        });
        track
    }

    /// A caption track, tagged `lang:<code>` when a language is given.
    pub fn caption_track(location: &str, language: Option<&str>) -> Track {
        let mut track = track(location);
        track.tags.push("public".to_string());
        if let Some(language) = language {
            track.tags.push(format!("lang:{}", language));
        }
        track
    }

    fn profile(
        identifier: &str,
        engine: &str,
        input: Vec<MediaCategory>,
        output: MediaCategory,
        suffix: &str,
        mime_type: &str,
        extension: &[(&str, &str)],
    ) -> EncodingProfile {
        EncodingProfile {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            engine: engine.to_string(),
            input,
            output,
            suffix: suffix.to_string(),
            mime_type: Some(mime_type.to_string()),
            extension: extension
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    /// `mp4-hd`: H.264 encode to `.mp4`.
    pub fn mp4_profile() -> EncodingProfile {
        profile(
            "mp4-hd",
            "ffmpeg",
            vec![MediaCategory::Video],
            MediaCategory::Video,
            ".mp4",
            "video/mp4",
            &[
                (
                    "ffmpeg.command",
                    "-y -i #{in.video.path} -c:v libx264 -crf #{crf} #{out.dir}/#{out.name}#{out.suffix}",
                ),
                ("crf", "23"),
            ],
        )
    }

    /// `mux-mkv`: copies an audio and a video track into `.mkv`.
    pub fn mux_profile() -> EncodingProfile {
        profile(
            "mux-mkv",
            "ffmpeg",
            vec![MediaCategory::Audio, MediaCategory::Video],
            MediaCategory::Video,
            ".mkv",
            "video/x-matroska",
            &[(
                "ffmpeg.command",
                "-y -i #{in.video.path} -i #{in.audio.path} -map 0:v -map 1:a -c copy #{out.dir}/#{out.name}#{out.suffix}",
            )],
        )
    }

    /// `trim`: stream copy of a time range.
    pub fn trim_profile() -> EncodingProfile {
        profile(
            "trim",
            "ffmpeg",
            vec![MediaCategory::Audio, MediaCategory::Video],
            MediaCategory::Video,
            "-trimmed.mp4",
            "video/mp4",
            &[(
                "ffmpeg.command",
                "-y -ss #{trim.start} -i #{in.video.path} -t #{trim.duration} -c copy #{out.dir}/#{out.name}#{out.suffix}",
            )],
        )
    }

    /// `thumb`: one JPEG frame at `time`.
    pub fn thumb_profile() -> EncodingProfile {
        profile(
            "thumb",
            "ffmpeg",
            vec![MediaCategory::Video],
            MediaCategory::Image,
            "-thumb.jpg",
            "image/jpeg",
            &[(
                "ffmpeg.command",
                "-y -ss #{time} -i #{in.video.path} -frames:v 1 #{out.dir}/#{out.name}#{out.suffix}",
            )],
        )
    }

    /// `captions-embed`: embeds caption tracks with the embedder binary.
    pub fn caption_profile() -> EncodingProfile {
        profile(
            "captions-embed",
            "embedder",
            vec![MediaCategory::Video],
            MediaCategory::Video,
            "-captioned.mp4",
            "video/mp4",
            &[(
                "embedder.command",
                "-trackh #{param.trackh} -offset #{param.offset} -languages #{param.languages} -captions #{param.captions} #{in.video.path} #{out.dir}/#{out.name}#{out.suffix}",
            )],
        )
    }

    /// Every fixture profile.
    pub fn profiles() -> Vec<EncodingProfile> {
        vec![
            mp4_profile(),
            mux_profile(),
            trim_profile(),
            thumb_profile(),
            caption_profile(),
        ]
    }
}
