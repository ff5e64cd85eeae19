//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (bind_address, port)
//!     → listener.rs (resolve, bind)
//!     → Hand off to HTTP layer (axum::serve)
//! ```

pub mod listener;

pub use listener::{bind, ListenerError};
