use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
/// (`COMPOSER_COMPOSER__MAX_WORKERS=8` sets `composer.max_workers`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("COMPOSER_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::DispatchMode;
    use crate::media::MediaCategory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r##"
[server]
port = 9000

[composer]
max_workers = 2
dispatch = "external"

[[profiles]]
identifier = "mp4-hd"
name = "MP4 HD"
input = ["video"]
output = "video"
suffix = "-hd.mp4"
mime_type = "video/mp4"

[profiles.extension]
"ffmpeg.command" = "-y -i #{in.video.path} #{out.dir}/#{out.name}#{out.suffix}"
"##;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.composer.max_workers, 2);
        assert_eq!(config.composer.dispatch, DispatchMode::External);
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].input, vec![MediaCategory::Video]);
        assert!(config.profiles[0].command("ffmpeg").is_some());
    }

    #[test]
    fn test_load_config_from_str_empty() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let toml = r#"
[composer]
dispatch = "carrier-pigeon"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[engine]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.engine.ffmpeg_path,
            std::path::PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
    }
}
