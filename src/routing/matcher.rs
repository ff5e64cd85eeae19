//! Route matching logic.
//!
//! # Responsibilities
//! - Split route paths into a real directory and a glob pattern
//! - Decide whether a request path falls under a route
//! - Walk the table in order, consulting the filesystem, until a route wins
//!
//! # Design Decisions
//! - First match wins; table order is declaration pre-order
//! - A route whose directory holds the file wins even if its pattern does not
//!   match, so directory requests reach their index.html
//! - A matching route wins even without a file; its scripts generate content
//! - Requests no route claims fall back to plain lookup beneath the root

use crate::files::{FileSource, NotFound};
use crate::routing::glob::{has_magic, Pattern};
use crate::routing::table::{ResolvedRoute, RouteTable};

/// How a route's pattern is compared against request paths.
#[derive(Debug, Clone)]
pub enum MatchRule {
    /// Full-path glob match.
    Glob(Pattern),
    /// Literal prefix; an empty prefix claims every request.
    Prefix(String),
}

impl MatchRule {
    /// Returns true if `request` falls under this rule.
    pub fn is_match(&self, request: &str) -> bool {
        match self {
            MatchRule::Glob(pattern) => pattern.matches(request),
            MatchRule::Prefix(prefix) => {
                request.starts_with(prefix.as_str())
                    || (prefix.is_empty() && parent_dir(request) == prefix.as_str())
            }
        }
    }
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Split a route path into its base directory and the pattern beneath it.
///
/// The base is the longest run of leading segments free of glob
/// metacharacters; the pattern is everything from the first magic segment on.
/// A pattern never starts mid-segment: `src/app*.js` splits into `src` and
/// `app*.js`.
pub fn split_base_and_pattern(path: &str) -> (String, String) {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.iter().position(|segment| has_magic(segment)) {
        Some(index) => (segments[..index].join("/"), segments[index..].join("/")),
        None => (path.to_string(), String::new()),
    }
}

impl ResolvedRoute {
    /// Returns true if this route's pattern claims `request`.
    pub fn is_match(&self, request: &str) -> bool {
        self.rule().is_match(request)
    }
}

/// Outcome of matching one request.
#[derive(Debug)]
pub struct Resolution<'t, F> {
    /// The governing route, if any.
    pub route: Option<&'t ResolvedRoute>,
    /// The file to serve, or why there is none.
    pub file: Result<F, NotFound>,
}

impl<F> Resolution<'_, F> {
    /// Scripts of the governing route; empty without one.
    pub fn scripts(&self) -> &[String] {
        self.route.map(ResolvedRoute::scripts).unwrap_or_default()
    }
}

impl RouteTable {
    /// Find the route governing `request` and the file it resolves to.
    ///
    /// `request` is a normalized path without the leading slash.
    pub async fn resolve<'t, S: FileSource>(
        &'t self,
        source: &S,
        request: &str,
    ) -> Resolution<'t, S::File> {
        for route in self {
            let is_match = route.is_match(request);
            match source.open(route.base(), request).await {
                Ok(file) => {
                    tracing::debug!(route = %route, request, "Route resolved file");
                    return Resolution {
                        route: Some(route),
                        file: Ok(file),
                    };
                }
                Err(err) if is_match => {
                    tracing::debug!(route = %route, request, reason = %err, "Route matched without file");
                    return Resolution {
                        route: Some(route),
                        file: Err(err),
                    };
                }
                Err(_) => continue,
            }
        }

        Resolution {
            route: None,
            file: source.open("", request).await,
        }
    }
}
