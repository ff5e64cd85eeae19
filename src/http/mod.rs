//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve)
//!     → server.rs (middleware: request ID, trace, timeout, catch panic)
//!     → request.rs (normalize path)
//!     → handler.rs (route table → file and/or pipeline)
//!     → response.rs (stream body, or plain-text 404/500)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - One catch-all handler; every method is treated alike
//! - Bodies are streamed, never buffered

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use request::{normalize_path, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
