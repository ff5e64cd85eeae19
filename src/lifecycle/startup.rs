//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration and resolve the root
//! - Discover named scripts and build the route table
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinHandle;

use super::shutdown::Shutdown;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, ServerConfig};
use crate::http::{AppState, HttpServer};
use crate::net::{self, ListenerError};
use crate::pipeline::NamedScripts;
use crate::routing::RouteTable;

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Failed to read bound address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// A server accepting connections in the background.
pub struct RunningServer {
    local_addr: SocketAddr,
    root: PathBuf,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningServer {
    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The canonical root files are served from.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Base URL for requests, e.g. `http://127.0.0.1:8000`.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn stop(self) -> Result<(), std::io::Error> {
        self.shutdown.trigger();
        self.wait().await
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> Result<(), std::io::Error> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(std::io::Error::other(err)),
        }
    }
}

/// Bring the server up.
pub async fn start(config: ServerConfig) -> Result<RunningServer, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let root = tokio::fs::canonicalize(&config.root)
        .await
        .map_err(|source| ConfigError::Root {
            path: config.root.display().to_string(),
            source,
        })?;

    let scripts = NamedScripts::discover(&root, &config.manifest)?;
    if let Some(manifest) = scripts.manifest() {
        tracing::info!(manifest = %manifest.display(), scripts = scripts.len(), "Named scripts loaded");
    }
    let table = RouteTable::build(&config.routes)?;

    let listener = net::bind(&config.listener).await?;
    let local_addr = listener.local_addr().map_err(StartupError::LocalAddr)?;

    tracing::info!("Server listening on http://{}", local_addr);
    for route in &table {
        tracing::info!("{}", route.describe());
        for script in route.scripts() {
            let name = script.split_whitespace().next().unwrap_or_default();
            if let Some(command) = scripts.get(name) {
                tracing::debug!(script = name, command, "Runs named script");
            }
        }
    }

    let state = AppState::new(&root, table, scripts);
    let server = HttpServer::new(state, &config.timeouts);
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Ok(RunningServer {
        local_addr,
        root,
        shutdown,
        handle,
    })
}
