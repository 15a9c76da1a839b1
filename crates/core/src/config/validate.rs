use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Composer has at least one worker and a non-zero poll interval
/// - Profile identifiers are unique
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Composer validation
    if config.composer.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "composer.max_workers must be at least 1".to_string(),
        ));
    }
    if config.composer.inspection_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "composer.inspection_poll_interval_ms cannot be 0".to_string(),
        ));
    }

    // Profile validation
    let mut seen = HashSet::new();
    for profile in &config.profiles {
        if !seen.insert(profile.identifier.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate profile identifier: {}",
                profile.identifier
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_validate_valid_config() {
        let config = Config {
            profiles: fixtures::profiles(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = Config::default();
        config.composer.max_workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = Config::default();
        config.composer.inspection_poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_profiles_fail() {
        let config = Config {
            profiles: vec![fixtures::mp4_profile(), fixtures::mp4_profile()],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("mp4-hd"));
    }
}
