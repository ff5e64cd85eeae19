//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteNode tree
//!     → table.rs (pre-order flatten, join paths)
//!     → matcher.rs (split base directory / glob pattern)
//!     → glob.rs (compile pattern)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (normalized path)
//!     → matcher.rs (ordered scan, filesystem check per route)
//!     → Return: Resolution (route or none, file or NotFound)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same path and filesystem always pick the same route
//! - First match wins (ordered by declaration)

pub mod glob;
pub mod matcher;
pub mod table;

pub use matcher::{split_base_and_pattern, MatchRule, Resolution};
pub use table::{ResolvedRoute, RouteTable};
