//! zulu development file server library.

// Core subsystems
pub mod config;
pub mod files;
pub mod http;
pub mod net;
pub mod pipeline;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::{start, RunningServer, Shutdown, StartupError};
