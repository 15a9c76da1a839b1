//! Engine resolution for a profile.

use std::collections::HashMap;
use std::sync::Arc;

use crate::profile::EncodingProfile;

use super::config::EngineConfig;
use super::embedder::EmbedderEngine;
use super::encoder::EncoderEngine;
use super::listener::Listeners;
use super::runner::ProcessRunner;
use super::traits::Engine;

/// Provides the engine that executes a profile.
pub trait EngineFactory: Send + Sync {
    /// `None` when no engine is available for the profile.
    fn engine_for(&self, profile: &EncodingProfile) -> Option<Arc<dyn Engine>>;
}

/// Engines keyed by name, matched against `EncodingProfile::engine`.
#[derive(Clone, Default)]
pub struct CommandEngineFactory {
    engines: HashMap<String, Arc<dyn Engine>>,
}

impl CommandEngineFactory {
    /// Registers the encoder and embedder engines with the configured binaries.
    pub fn new(config: &EngineConfig, runner: Arc<dyn ProcessRunner>, listeners: Listeners) -> Self {
        let mut factory = Self::default();
        factory.register(Arc::new(EncoderEngine::new(
            config.ffmpeg_path.to_string_lossy(),
            runner.clone(),
            listeners.clone(),
        )));
        factory.register(Arc::new(EmbedderEngine::new(
            config.embedder_path.to_string_lossy(),
            runner,
            listeners,
        )));
        factory
    }

    /// Adds or replaces an engine under its own name.
    pub fn register(&mut self, engine: Arc<dyn Engine>) {
        self.engines.insert(engine.name().to_string(), engine);
    }

    pub fn engine_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }
}

impl EngineFactory for CommandEngineFactory {
    fn engine_for(&self, profile: &EncodingProfile) -> Option<Arc<dyn Engine>> {
        self.engines.get(&profile.engine).cloned()
    }
}
