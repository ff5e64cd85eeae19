//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require a root directory
//! - Require a path on every route node, at any depth
//! - Reject blank script entries (nothing to execute)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{RouteNode, ServerConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No root directory was given.
    MissingRoot,
    /// The route at `location` has no path.
    MissingRoutePath { location: String },
    /// Script number `index` of the route at `location` is blank.
    BlankScript { location: String, index: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingRoot => write!(f, "root directory must be specified"),
            ValidationError::MissingRoutePath { location } => {
                write!(f, "route {} must have a path", location)
            }
            ValidationError::BlankScript { location, index } => {
                write!(f, "script {} of route {} is blank", index, location)
            }
        }
    }
}

/// Validate a whole server configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.root.as_os_str().is_empty() {
        errors.push(ValidationError::MissingRoot);
    }
    errors.extend(route_errors(&config.routes));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a route tree on its own.
///
/// Locations are reported as dotted indices (`routes[0].routes[2]`).
pub fn validate_routes(routes: &[RouteNode]) -> Result<(), Vec<ValidationError>> {
    let errors = route_errors(routes);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn route_errors(routes: &[RouteNode]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (index, route) in routes.iter().enumerate() {
        check_route(route, format!("routes[{}]", index), &mut errors);
    }
    errors
}

fn check_route(route: &RouteNode, location: String, errors: &mut Vec<ValidationError>) {
    if route.path.as_deref().map_or(true, str::is_empty) {
        errors.push(ValidationError::MissingRoutePath {
            location: location.clone(),
        });
    }
    for (index, script) in route.scripts.iter().enumerate() {
        if script.trim().is_empty() {
            errors.push(ValidationError::BlankScript {
                location: location.clone(),
                index,
            });
        }
    }
    for (index, child) in route.routes.iter().enumerate() {
        check_route(child, format!("{}.routes[{}]", location, index), errors);
    }
}
