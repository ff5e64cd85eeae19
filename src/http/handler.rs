//! The request handler.
//!
//! Every method and every path goes through [`serve_request`]: normalize the
//! path, resolve it against the route table, then stream the file, a pipeline
//! or an error.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};

use super::request::{normalize_path, request_id};
use super::response;
use super::server::AppState;
use crate::files::{guess_content_type, NotFound};
use crate::observability::metrics;
use crate::pipeline::{Input, Pipeline, SpawnError};
use crate::routing::ResolvedRoute;

/// Main request handler.
pub async fn serve_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().to_string();
    let uri_path = request.uri().path().to_string();

    let path = match normalize_path(&uri_path) {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!(request_id = %request_id, path = %uri_path, reason = %err, "Rejected request path");
            let not_found = NotFound::new(uri_path.trim_start_matches('/'), err.to_string());
            metrics::record_request(&method, 404, "none", start);
            return response::not_found(not_found.to_string());
        }
    };

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Serving request");

    let mut content_type = guess_content_type(&path);
    let resolution = state.table.resolve(&state.files, &path).await;
    let route = resolution
        .route
        .map(|route| route.to_string())
        .unwrap_or_else(|| "none".to_string());
    let scripts = resolution
        .route
        .map(ResolvedRoute::scripts)
        .unwrap_or_default();

    let input: Option<Input> = match resolution.file {
        Ok(file) => {
            content_type = file.content_type;
            Some(Box::new(file.file))
        }
        Err(not_found) if scripts.is_empty() => {
            tracing::debug!(request_id = %request_id, path = %path, reason = %not_found, "Not found");
            metrics::record_request(&method, 404, &route, start);
            return response::not_found(not_found.to_string());
        }
        Err(not_found) => {
            tracing::debug!(
                request_id = %request_id,
                path = %path,
                reason = %not_found,
                "No file, generating from scripts"
            );
            None
        }
    };

    let pipeline = match Pipeline::spawn(&state.scripts, state.files.root(), scripts, input) {
        Ok(pipeline) => pipeline,
        Err(err) => return pipeline_failed(&request_id, &method, &route, start, err),
    };
    let stages = pipeline.stages().len();

    match pipeline.into_body().await {
        Ok(body) => {
            tracing::debug!(
                request_id = %request_id,
                route = %route,
                stages,
                content_type = %content_type,
                "Streaming response"
            );
            metrics::record_request(&method, 200, &route, start);
            response::stream(&content_type, body)
        }
        Err(err) => pipeline_failed(&request_id, &method, &route, start, err),
    }
}

fn pipeline_failed(
    request_id: &str,
    method: &str,
    route: &str,
    start: Instant,
    err: SpawnError,
) -> Response {
    tracing::error!(request_id, route, error = %err, "Pipeline failed");
    metrics::record_request(method, 500, route, start);
    response::internal_error(err.to_string())
}
