use composer_core::{ComposerService, Config};

/// Shared application state
pub struct AppState {
    config: Config,
    composer: ComposerService,
}

impl AppState {
    pub fn new(config: Config, composer: ComposerService) -> Self {
        Self { config, composer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn composer(&self) -> &ComposerService {
        &self.composer
    }
}
