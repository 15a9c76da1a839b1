//! Track and stream types.

use serde::{Deserialize, Serialize};

/// Prefix of the tag that carries a track's language.
const LANGUAGE_TAG_PREFIX: &str = "lang:";

/// Category of media a profile consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Audio,
    Video,
    Image,
}

/// A video stream inside a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f32>,
}

/// An audio stream inside a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
}

/// A media artifact: a location handle in the workspace plus the facts known about it.
///
/// Source tracks are read-only for the composer. Produced tracks come back from
/// inspection and receive a fresh `identifier` before they become a job payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Workspace location of the media file.
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub video: Vec<VideoStream>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<AudioStream>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Track {
    /// Creates a track with only a location.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn has_video(&self) -> bool {
        !self.video.is_empty()
    }

    pub fn has_audio(&self) -> bool {
        !self.audio.is_empty()
    }

    /// Frame height of the first video stream that reports one.
    pub fn frame_height(&self) -> Option<u32> {
        self.video.iter().find_map(|v| v.frame_height)
    }

    /// Language code from the first `lang:<code>` tag, if any.
    pub fn language(&self) -> Option<&str> {
        self.tags.iter().find_map(|tag| {
            tag.strip_prefix(LANGUAGE_TAG_PREFIX)
                .map(str::trim)
                .filter(|code| !code.is_empty())
        })
    }
}

/// Best-effort mime type for a file extension (without the dot).
pub fn guess_mime_type(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "ts" => "video/mp2t",
        "flv" => "video/x-flv",
        "mp3" => "audio/mpeg",
        "m4a" | "aac" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "vtt" => "text/vtt",
        "srt" => "application/x-subrip",
        "dfxp" | "xml" => "application/xml",
        _ => return None,
    };
    Some(mime)
}
