//! Response construction.
//!
//! # Responsibilities
//! - Build streaming responses from files and pipelines
//! - Map lookup and spawn failures to plain-text error responses
//! - Turn handler panics into 500s
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - Error bodies are the error's message, as `text/plain`
//! - Content type is decided before the first byte is sent

use std::any::Any;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use mime_guess::Mime;

/// A `200 OK` streaming `body` with the given content type.
pub fn stream(content_type: &Mime, body: Body) -> Response {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

/// A plain-text `404 Not Found` with `message` as the body.
pub fn not_found(message: impl Into<String>) -> Response {
    plain(StatusCode::NOT_FOUND, message.into())
}

/// A plain-text `500 Internal Server Error` with `message` as the body.
pub fn internal_error(message: impl Into<String>) -> Response {
    plain(StatusCode::INTERNAL_SERVER_ERROR, message.into())
}

fn plain(status: StatusCode, message: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message,
    )
        .into_response()
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    tracing::error!(panic = %message, "Handler panicked");
    internal_error(message)
}
