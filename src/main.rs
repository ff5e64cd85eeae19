//! zulu: a development file server that pipes content through scripts.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────▶ net::listener ──▶ http::server ──▶ http::handler
//!                                                     │
//!                                                     ▼
//!                                          routing::RouteTable::resolve
//!                                          (glob / prefix match, files::FileResolver)
//!                                                     │
//!                                                     ▼
//!     Client Response                      pipeline::Pipeline
//!     ◀────── http::response ◀──────────── (file → stage₁ → … → stageₙ)
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;
use zulu::config::{load_config, RouteNode, ServerConfig};
use zulu::lifecycle::{self, shutdown_signal};
use zulu::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "zulu")]
#[command(about = "Serve files, piping select routes through scripts", long_about = None)]
#[command(after_help = "The command line declares a single top-level route. Nested routes \
and several top-level routes are declared in a config file given with --config; a PATH \
and --script on the command line add one more route after those.")]
struct Cli {
    /// Route path or glob, relative to the root
    path: Option<String>,

    /// Server port (0 picks a free one)
    #[arg(short, long)]
    port: Option<u16>,

    /// Pipe the route through this script; repeat to chain
    #[arg(short, long = "script")]
    scripts: Vec<String>,

    /// Load routes and settings from a TOML or JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve (default: current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long = "bind")]
    bind: Option<String>,
}

impl Cli {
    /// Merge the command line with the optional config file.
    fn into_config(self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::new(std::env::current_dir()?, Vec::new()),
        };

        if self.path.is_some() || !self.scripts.is_empty() || config.routes.is_empty() {
            let path = self.path.unwrap_or_else(|| "./".to_string());
            config.routes.push(RouteNode {
                path: Some(path),
                scripts: self.scripts,
                routes: Vec::new(),
            });
        }

        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);
    tracing::debug!(
        root = %config.root.display(),
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = lifecycle::start(config).await?;
    let shutdown = server.shutdown().clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.wait().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
