//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory files are served from and scripts run in.
    pub root: PathBuf,

    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Route tree, in declaration order.
    pub routes: Vec<RouteNode>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Named-script manifest lookup.
    pub manifest: ManifestConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Configuration serving `root` with the given routes and defaults elsewhere.
    pub fn new(root: impl Into<PathBuf>, routes: Vec<RouteNode>) -> Self {
        Self {
            root: root.into(),
            routes,
            ..Self::default()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to bind (e.g., "127.0.0.1").
    pub bind_address: String,

    /// Port to bind. 0 lets the OS pick an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the socket layer.
    pub fn socket_address(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

/// A declared route. Nodes nest; a child's path is relative to its parent's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteNode {
    /// Path segment or glob fragment, e.g. `public` or `**/*.@(jpg|png)`.
    #[serde(default)]
    pub path: Option<String>,

    /// Commands the matched content is piped through, in order.
    #[serde(default)]
    pub scripts: Vec<String>,

    /// Nested routes.
    #[serde(default)]
    pub routes: Vec<RouteNode>,
}

impl RouteNode {
    /// A route without scripts or children.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Append a script to this route.
    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.scripts.push(script.into());
        self
    }

    /// Append a child route.
    pub fn route(mut self, child: RouteNode) -> Self {
        self.routes.push(child);
        self
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until response headers are produced, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Where named scripts come from and how they are run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Manifest file name, looked up in the root and then its ancestors.
    pub file: String,

    /// Program that runs a named script.
    pub runner: String,

    /// Arguments placed between the runner and the script name.
    pub runner_args: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file: "package.json".to_string(),
            runner: "npm".to_string(),
            runner_args: vec!["run".to_string(), "--silent".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
