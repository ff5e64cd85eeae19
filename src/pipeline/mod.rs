//! Process pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! route scripts ["sed s/a/b/", "build:css"]
//!     → command.rs (named script or direct executable)
//!     → stage.rs (spawn in root, piped stdio)
//!     → chain.rs (file → stage₁ → … → stageₙ → response body)
//!
//! No file resolved:
//!     stage₁ (null stdin) → stage₂ → … → response body
//! ```
//!
//! # Design Decisions
//! - Every stage is spawned up front, before the first byte is streamed
//! - Pumps copy through bounded buffers; a slow reader throttles its producer
//! - The Pipeline owns all children; dropping it kills them
//! - A stage exiting non-zero fails the response: a 500 if nothing was sent
//!   yet, an aborted body otherwise
//! - Named scripts come from the project manifest (manifest.rs)

use thiserror::Error;

pub mod chain;
pub mod command;
pub mod manifest;
pub mod stage;

pub use chain::{Input, Pipeline};
pub use command::{resolve_command, Invocation, Launcher};
pub use manifest::NamedScripts;
pub use stage::Stage;

/// Errors raised while starting a pipeline.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// A script string had no command in it.
    #[error("script is empty")]
    EmptyScript,

    /// The OS refused to start the process.
    #[error("failed to spawn \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process started without the stdout pipe it was asked for.
    #[error("\"{command}\" has no stdout")]
    MissingPipe { command: String },

    /// A stage ran and exited with a non-zero code.
    #[error("\"{command}\" exited with status {code}")]
    Exited { command: String, code: i32 },

    /// Reading the last stage's output failed.
    #[error("failed to read pipeline output: {0}")]
    Output(#[source] std::io::Error),
}
