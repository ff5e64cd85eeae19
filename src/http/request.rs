//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Normalize the URI path into a root-relative request path
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept as is
//! - Paths are normalized lexically; one that climbs above the root is refused

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Makes a fresh UUID v4 request ID for each request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the middleware.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Why a URI path cannot be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidPath {
    /// Percent-decoding produced invalid UTF-8.
    Encoding,
    /// `..` segments lead above the root.
    Traversal,
}

impl std::fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPath::Encoding => write!(f, "Malformed path encoding"),
            InvalidPath::Traversal => write!(f, "Path escapes the root"),
        }
    }
}

/// Turn a URI path into a request path: decoded, without the leading slash,
/// with empty and `.` segments dropped and `..` applied.
pub fn normalize_path(uri_path: &str) -> Result<String, InvalidPath> {
    let decoded = urlencoding::decode(uri_path).map_err(|_| InvalidPath::Encoding)?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or(InvalidPath::Traversal)?;
            }
            _ => segments.push(segment),
        }
    }
    Ok(segments.join("/"))
}
