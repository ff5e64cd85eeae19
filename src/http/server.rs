//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all handler
//! - Wire up middleware (tracing, request ID, timeout, panic recovery)
//! - Serve on a bound listener until shutdown

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handler::serve_request;
use super::request::UuidRequestId;
use super::response::panic_response;
use crate::config::TimeoutConfig;
use crate::files::FileResolver;
use crate::pipeline::NamedScripts;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub files: FileResolver,
    pub scripts: Arc<NamedScripts>,
}

impl AppState {
    pub fn new(root: impl AsRef<Path>, table: RouteTable, scripts: NamedScripts) -> Self {
        Self {
            table: Arc::new(table),
            files: FileResolver::new(root),
            scripts: Arc::new(scripts),
        }
    }
}

/// HTTP server for the route table.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, timeouts: &TimeoutConfig) -> Self {
        Self {
            router: Self::build_router(state, timeouts),
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outside-in: the request ID is set before the trace span
    /// opens and copied onto the response on the way out.
    #[allow(deprecated)]
    fn build_router(state: AppState, timeouts: &TimeoutConfig) -> Router {
        Router::new()
            .route("/{*path}", any(serve_request))
            .route("/", any(serve_request))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
