//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check mount patterns are usable route prefixes
//! - Check mount roots exist and are directories
//! - Detect mounts that would claim the same prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure apart from `stat`ing mount roots
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::routing::{FileRouteConfig, RouteError};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("mount {index}: {source}")]
    Pattern {
        index: usize,
        #[source]
        source: RouteError,
    },

    #[error("mount {pattern:?}: root {} is not a directory", .root.display())]
    Root { pattern: String, root: PathBuf },

    #[error("mount {pattern:?}: prefix {prefix:?} is already mounted")]
    Duplicate { pattern: String, prefix: String },
}

/// Check `config` for problems serde cannot catch.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let mut prefixes = HashSet::new();
    for (index, mount) in config.mounts.iter().enumerate() {
        let route = match FileRouteConfig::new(mount.pattern.clone(), mount.root.clone()) {
            Ok(route) => route,
            Err(source) => {
                errors.push(ValidationError::Pattern { index, source });
                continue;
            }
        };

        if !mount.root.is_dir() {
            errors.push(ValidationError::Root {
                pattern: mount.pattern.clone(),
                root: mount.root.clone(),
            });
        }

        let prefix = route.prefix();
        if !prefixes.insert(prefix.clone()) {
            errors.push(ValidationError::Duplicate {
                pattern: mount.pattern.clone(),
                prefix,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::MountConfig;

    fn mount(pattern: &str, root: impl Into<PathBuf>) -> MountConfig {
        MountConfig {
            pattern: pattern.to_string(),
            root: root.into(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.mounts.push(mount("/{file}", dir.path()));
        config.mounts.push(mount("/assets", dir.path().join("missing")));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ValidationError::BindAddress("not-an-address".into()));
        assert!(matches!(
            errors[1],
            ValidationError::Pattern { index: 0, source: RouteError::UrlParameters(_) }
        ));
        assert!(matches!(errors[2], ValidationError::Root { .. }));
    }

    #[test]
    fn test_slash_variants_collide() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.mounts.push(mount("/static", dir.path()));
        config.mounts.push(mount("/static/", dir.path()));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Duplicate {
                pattern: "/static/".into(),
                prefix: "/static/".into(),
            }]
        );
    }
}
