//! Profile registry trait and the config-backed implementation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::media::MediaCategory;

use super::types::EncodingProfile;

/// Source of encoding profiles.
pub trait ProfileRegistry: Send + Sync {
    /// Looks up a profile by identifier.
    fn get_profile(&self, id: &str) -> Option<Arc<EncodingProfile>>;

    /// All known profiles, ordered by identifier.
    fn list_profiles(&self) -> Vec<Arc<EncodingProfile>>;

    /// Profiles that accept the given input category.
    fn list_applicable(&self, category: MediaCategory) -> Vec<Arc<EncodingProfile>> {
        self.list_profiles()
            .into_iter()
            .filter(|p| p.applies_to(category))
            .collect()
    }
}

/// Registry over a fixed set of profiles loaded at startup.
#[derive(Debug, Default)]
pub struct StaticProfileRegistry {
    profiles: HashMap<String, Arc<EncodingProfile>>,
}

impl StaticProfileRegistry {
    /// Builds a registry. Later entries replace earlier ones with the same identifier.
    pub fn new(profiles: impl IntoIterator<Item = EncodingProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.identifier.clone(), Arc::new(p)))
            .collect();
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileRegistry for StaticProfileRegistry {
    fn get_profile(&self, id: &str) -> Option<Arc<EncodingProfile>> {
        self.profiles.get(id).cloned()
    }

    fn list_profiles(&self) -> Vec<Arc<EncodingProfile>> {
        let mut profiles: Vec<_> = self.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, input: Vec<MediaCategory>) -> EncodingProfile {
        EncodingProfile {
            identifier: id.to_string(),
            name: id.to_string(),
            engine: "ffmpeg".to_string(),
            input,
            output: MediaCategory::Video,
            suffix: ".mp4".to_string(),
            mime_type: None,
            extension: HashMap::new(),
        }
    }

    #[test]
    fn test_get_and_list() {
        let registry = StaticProfileRegistry::new(vec![
            profile("b", vec![MediaCategory::Video]),
            profile("a", vec![MediaCategory::Audio]),
        ]);

        assert_eq!(registry.len(), 2);
        assert!(registry.get_profile("a").is_some());
        assert!(registry.get_profile("missing").is_none());

        let ids: Vec<_> = registry
            .list_profiles()
            .iter()
            .map(|p| p.identifier.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_list_applicable() {
        let registry = StaticProfileRegistry::new(vec![
            profile("audio-only", vec![MediaCategory::Audio]),
            profile("av", vec![MediaCategory::Audio, MediaCategory::Video]),
        ]);

        let audio = registry.list_applicable(MediaCategory::Audio);
        assert_eq!(audio.len(), 2);
        let video = registry.list_applicable(MediaCategory::Video);
        assert_eq!(video.len(), 1);
        assert_eq!(video[0].identifier, "av");
    }

    #[test]
    fn test_snapshots_are_shared() {
        let registry = StaticProfileRegistry::new(vec![profile("a", vec![])]);
        let first = registry.get_profile("a").unwrap();
        let second = registry.get_profile("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
