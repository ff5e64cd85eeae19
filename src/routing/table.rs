//! Route table construction.
//!
//! # Responsibilities
//! - Flatten the declared route tree into one ordered list
//! - Join each node's path onto its parent's
//! - Split every path into a base directory and a match rule once, up front
//!
//! # Design Decisions
//! - Pre-order traversal: a parent precedes its children, earlier siblings
//!   precede later ones, and that order is the match precedence
//! - Immutable after construction (shared through Arc without locks)
//! - Invalid trees are rejected here, before anything listens

use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigError, RouteNode};
use crate::config::validation::validate_routes;
use crate::routing::glob::{has_magic, Pattern};
use crate::routing::matcher::{split_base_and_pattern, MatchRule};

/// One flattened route.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    path: String,
    base: String,
    rule: MatchRule,
    scripts: Arc<[String]>,
}

impl ResolvedRoute {
    /// Build a route from its full (already joined) path.
    pub fn new(path: impl Into<String>, scripts: impl Into<Arc<[String]>>) -> Self {
        let path = path.into();
        let (base, pattern) = split_base_and_pattern(&path);
        let rule = if has_magic(&pattern) {
            MatchRule::Glob(Pattern::new(&pattern))
        } else {
            MatchRule::Prefix(pattern)
        };
        Self {
            path,
            base,
            rule,
            scripts: scripts.into(),
        }
    }

    /// Full route path, glob fragments included. Empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Filesystem directory the route serves from, relative to the root.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Scripts content is piped through, in order.
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// One-line summary for the startup banner.
    pub fn describe(&self) -> String {
        let path = if self.path.is_empty() { "." } else { &self.path };
        let names: Vec<String> = self
            .scripts
            .iter()
            .map(|script| format!("\"{}\"", script.split_whitespace().next().unwrap_or_default()))
            .collect();
        match names.split_last() {
            None => format!("Serving files from {}", path),
            Some((last, [])) => format!("Piping files from {} through {}", path, last),
            Some((last, init)) => {
                format!("Piping files from {} through {} and {}", path, init.join(", "), last)
            }
        }
    }
}

impl fmt::Display for ResolvedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&self.path)
        }
    }
}

/// Ordered, immutable list of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<ResolvedRoute>,
}

impl RouteTable {
    /// Validate and flatten a route tree.
    pub fn build(nodes: &[RouteNode]) -> Result<Self, ConfigError> {
        validate_routes(nodes).map_err(ConfigError::Validation)?;

        let mut routes = Vec::new();
        for node in nodes {
            flatten(node, "", &mut routes);
        }

        tracing::debug!(routes = routes.len(), "Route table built");
        Ok(Self { routes })
    }

    /// A table from already-flattened routes, kept in the given order.
    pub fn from_routes(routes: Vec<ResolvedRoute>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a ResolvedRoute;
    type IntoIter = std::slice::Iter<'a, ResolvedRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

fn flatten(node: &RouteNode, parent: &str, routes: &mut Vec<ResolvedRoute>) {
    let path = join_route_path(parent, node.path.as_deref().unwrap_or_default());
    routes.push(ResolvedRoute::new(path.clone(), node.scripts.clone()));
    for child in &node.routes {
        flatten(child, &path, routes);
    }
}

/// Join a child path onto its parent.
///
/// Empty and `.` segments vanish, so `./` prefixes collapse and the root is the
/// empty string. `..` cancels the preceding plain segment and is kept when
/// there is none.
pub fn join_route_path(parent: &str, segment: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in parent.split('/').chain(segment.split('/')) {
        match part {
            "" | "." => {}
            ".." if parts.last().is_some_and(|last| *last != ".." && !has_magic(last)) => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}
