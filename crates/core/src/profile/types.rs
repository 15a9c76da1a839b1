//! Encoding profile record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::media::MediaCategory;

fn default_engine() -> String {
    "ffmpeg".to_string()
}

/// Describes how to turn one media category into another.
///
/// The command line for the engine lives in the extension map under
/// `<engine>.command`, e.g. `ffmpeg.command`. Every other extension entry is
/// exposed to the command template as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingProfile {
    pub identifier: String,
    pub name: String,
    /// Engine that executes this profile (`ffmpeg` or `embedder`).
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Media categories this profile accepts.
    #[serde(default)]
    pub input: Vec<MediaCategory>,
    pub output: MediaCategory,
    /// Output suffix template, e.g. `.mp4` or `-#{time}.jpg`.
    pub suffix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extension: HashMap<String, String>,
}

impl EncodingProfile {
    /// Raw option string for the given engine, if the profile defines one.
    pub fn command(&self, engine: &str) -> Option<&str> {
        self.extension
            .get(&format!("{}.command", engine))
            .map(String::as_str)
    }

    /// Extension parameter by key.
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extension.get(key).map(String::as_str)
    }

    /// Whether the profile accepts the given input category.
    pub fn applies_to(&self, category: MediaCategory) -> bool {
        self.input.contains(&category)
    }
}
