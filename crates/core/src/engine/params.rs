//! Per-request parameter table for command templates.
//!
//! Keys follow a fixed convention: `in.video.*` and `in.audio.*` describe the
//! inputs, `out.dir`, `out.name` and `out.suffix` describe the output. Profile
//! extension entries are added next, and caller-supplied parameters are merged
//! last so operation specific values win over the derived defaults.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::media::guess_mime_type;
use crate::profile::EncodingProfile;

use super::error::EngineError;
use super::template;

/// Caller-supplied parameters.
pub type ParamMap = HashMap<String, String>;

pub const OUT_DIR: &str = "out.dir";
pub const OUT_NAME: &str = "out.name";
pub const OUT_SUFFIX: &str = "out.suffix";

/// Input files of an engine operation. At least one must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineInputs<'a> {
    pub audio: Option<&'a Path>,
    pub video: Option<&'a Path>,
}

impl<'a> EngineInputs<'a> {
    /// A single input, placed in the video slot.
    pub fn single(path: &'a Path) -> Self {
        Self {
            audio: None,
            video: Some(path),
        }
    }

    pub fn muxed(audio: &'a Path, video: &'a Path) -> Self {
        Self {
            audio: Some(audio),
            video: Some(video),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }

    /// Output naming follows the video input if there is one.
    pub fn primary(&self) -> Option<&'a Path> {
        self.video.or(self.audio)
    }

    pub fn paths(&self) -> impl Iterator<Item = &'a Path> {
        self.audio.into_iter().chain(self.video)
    }
}

/// Placeholder name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    values: BTreeMap<String, String>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the table for one engine request.
    pub fn build(
        inputs: &EngineInputs<'_>,
        profile: &EncodingProfile,
        extra: &ParamMap,
    ) -> Result<Self, EngineError> {
        let primary = inputs.primary().ok_or(EngineError::NoInput)?;

        let mut table = Self::new();
        if let Some(video) = inputs.video {
            table.insert_input("in.video", video)?;
        }
        if let Some(audio) = inputs.audio {
            table.insert_input("in.audio", audio)?;
        }

        for (key, value) in &profile.extension {
            table.insert(key.clone(), value.clone());
        }
        for (key, value) in extra {
            table.insert(key.clone(), value.clone());
        }

        let primary = std::path::absolute(primary)?;
        if !table.contains(OUT_DIR) {
            let dir = primary
                .parent()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();
            table.insert(OUT_DIR, dir);
        }
        if !table.contains(OUT_NAME) {
            table.insert(OUT_NAME, file_stem(&primary));
        }
        if !table.contains(OUT_SUFFIX) {
            let suffix = template::substitute(&profile.suffix, &table);
            table.insert(OUT_SUFFIX, suffix);
        }

        Ok(table)
    }

    fn insert_input(&mut self, prefix: &str, path: &Path) -> Result<(), EngineError> {
        let path = std::path::absolute(path)?;
        let suffix = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        self.insert(format!("{}.path", prefix), path.to_string_lossy().to_string());
        self.insert(format!("{}.name", prefix), file_stem(&path));
        self.insert(format!("{}.filename", prefix), filename);
        if let Some(mime) = guess_mime_type(&suffix) {
            self.insert(format!("{}.mimetype", prefix), mime);
        }
        self.insert(format!("{}.suffix", prefix), suffix);
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `out.dir/out.name + out.suffix`, the path the engine expects the
    /// program to write to.
    pub fn output_path(&self) -> Option<PathBuf> {
        let dir = self.get(OUT_DIR)?;
        let name = self.get(OUT_NAME)?;
        let suffix = self.get(OUT_SUFFIX).unwrap_or_default();
        Some(Path::new(dir).join(format!("{}{}", name, suffix)))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
