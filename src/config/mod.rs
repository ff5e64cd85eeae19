//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON) or command line
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → routes flattened once into the RouteTable
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ListenerConfig;
pub use schema::ManifestConfig;
pub use schema::ObservabilityConfig;
pub use schema::RouteNode;
pub use schema::ServerConfig;
pub use schema::TimeoutConfig;
