//! Filesystem lookup subsystem.
//!
//! # Data Flow
//! ```text
//! (root, base directory, request path)
//!     → resolver.rs (stat, directory → index.html)
//!     → ResolvedFile (open handle + content type) or NotFound
//! ```
//!
//! # Design Decisions
//! - Every filesystem failure collapses into NotFound
//! - All I/O goes through tokio::fs so the accept loop never blocks
//! - Lookup sits behind the FileSource trait so matching can be tested
//!   against an in-memory tree

use std::future::Future;
use std::io;
use std::path::Path;

use mime_guess::Mime;
use thiserror::Error;

pub mod resolver;

pub use resolver::{FileResolver, ResolvedFile};

/// A request path did not resolve to a readable file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: /{path}")]
pub struct NotFound {
    /// Request path, without the leading slash.
    pub path: String,
    /// Short human-readable cause.
    pub reason: String,
}

impl NotFound {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Collapse an I/O error into a NotFound for `path`.
    pub fn from_io(path: impl Into<String>, err: &io::Error) -> Self {
        let reason = match err.kind() {
            io::ErrorKind::NotFound => "Not Found".to_string(),
            io::ErrorKind::PermissionDenied => "Permission Denied".to_string(),
            _ => err.to_string(),
        };
        Self::new(path, reason)
    }
}

/// Something that can turn a base directory and request path into a file.
pub trait FileSource {
    type File: Send;

    /// Look up `request` beneath `base`.
    fn open(
        &self,
        base: &str,
        request: &str,
    ) -> impl Future<Output = Result<Self::File, NotFound>> + Send;
}

/// Content type for a path, by extension.
pub fn guess_content_type(path: impl AsRef<Path>) -> Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}
