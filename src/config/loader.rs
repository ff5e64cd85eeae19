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

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("Root {path}: {source}")]
    Root {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML or JSON file.
///
/// Files ending in `.json` are read as JSON, everything else as TOML. A
/// relative `root` is resolved against the directory holding the file, and a
/// missing one defaults to that directory.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content, is_json(path))?;

    resolve_root(&mut config, path);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Anchor a relative or missing `root` at the directory holding `path`.
///
/// A bare file name lives in the current directory, `.`.
fn resolve_root(config: &mut ServerConfig, path: &Path) {
    if config.root.is_relative() {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        config.root = dir.join(&config.root);
    }
}

/// Parse configuration text without touching the filesystem or validating.
pub fn parse_config(content: &str, json: bool) -> Result<ServerConfig, ConfigError> {
    if json {
        Ok(serde_json::from_str(content)?)
    } else {
        Ok(toml::from_str(content)?)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
