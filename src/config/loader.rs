//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.observability.request_id);
    }

    #[test]
    fn test_parses_mounts() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[mounts]]
            pattern = "/static"
            root = {root:?}

            [observability]
            log_level = "debug"
            json = true
            "#,
            root = dir.path().display().to_string(),
        );

        let config = parse_config(&toml).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.mounts.len(), 1);
        assert_eq!(config.mounts[0].pattern, "/static");
        assert_eq!(config.mounts[0].root, dir.path());
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.json);
        assert!(config.observability.request_id);
    }

    #[test]
    fn test_rejects_invalid_mount() {
        let err = parse_config(
            r#"
            [[mounts]]
            pattern = "/files/*"
            root = "."
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("does not permit URL parameters"));
    }

    #[test]
    fn test_reports_syntax_errors() {
        assert!(matches!(parse_config("listener = ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
