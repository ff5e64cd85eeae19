//! Named scripts declared in a project manifest.
//!
//! The manifest is a `package.json`-style JSON document; only its `scripts`
//! object (name → command) is read. It is looked up in the root directory and
//! then in each ancestor, nearest first.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{ConfigError, ManifestConfig};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    scripts: BTreeMap<String, String>,
}

/// Script names known to the runner, and how to invoke the runner.
#[derive(Debug, Clone)]
pub struct NamedScripts {
    runner: String,
    runner_args: Vec<String>,
    scripts: BTreeMap<String, String>,
    manifest: Option<PathBuf>,
}

impl NamedScripts {
    /// An empty table using the configured runner.
    pub fn new(config: &ManifestConfig) -> Self {
        Self {
            runner: config.runner.clone(),
            runner_args: config.runner_args.clone(),
            scripts: BTreeMap::new(),
            manifest: None,
        }
    }

    /// Add a named script.
    pub fn with_script(mut self, name: impl Into<String>, command: impl Into<String>) -> Self {
        self.scripts.insert(name.into(), command.into());
        self
    }

    /// Find and read the nearest manifest at or above `root`.
    ///
    /// No manifest at all is not an error: the table is simply empty.
    pub fn discover(root: &Path, config: &ManifestConfig) -> Result<Self, ConfigError> {
        let mut named = Self::new(config);

        let Some(path) = root
            .ancestors()
            .map(|dir| dir.join(&config.file))
            .find(|candidate| candidate.is_file())
        else {
            tracing::debug!(root = %root.display(), file = %config.file, "No manifest found");
            return Ok(named);
        };

        let content = fs::read_to_string(&path).map_err(|err| ConfigError::Manifest {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        named.scripts = parse_scripts(&content).map_err(|err| ConfigError::Manifest {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        named.manifest = Some(path);
        Ok(named)
    }

    pub fn runner(&self) -> &str {
        &self.runner
    }

    pub fn runner_args(&self) -> &[String] {
        &self.runner_args
    }

    /// Returns true if `name` is a declared script.
    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Command a named script stands for.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    /// Manifest the scripts were read from.
    pub fn manifest(&self) -> Option<&Path> {
        self.manifest.as_deref()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl Default for NamedScripts {
    fn default() -> Self {
        Self::new(&ManifestConfig::default())
    }
}

fn parse_scripts(content: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    let manifest: Manifest = serde_json::from_str(content)?;
    Ok(manifest.scripts)
}
