//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use zulu::config::{RouteNode, ServerConfig};
use zulu::{start, RunningServer};

/// A temporary project tree:
///
/// ```text
/// index.html          "Hello world!\n"
/// foo/index.html      "Foo\n"
/// notes.unknownext    "plain bytes"
/// public/img/a.jpg    "raw image bytes"
/// src/app.js          "let answer = 42;\n"
/// ```
pub fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "Hello world!\n");
    write(dir.path(), "foo/index.html", "Foo\n");
    write(dir.path(), "notes.unknownext", "plain bytes");
    write(dir.path(), "public/img/a.jpg", "raw image bytes");
    write(dir.path(), "src/app.js", "let answer = 42;\n");
    dir
}

pub fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Start a server over `root` on an ephemeral port.
pub async fn serve(root: &Path, routes: Vec<RouteNode>) -> RunningServer {
    serve_config(ServerConfig::new(root, routes)).await
}

pub async fn serve_config(config: ServerConfig) -> RunningServer {
    start(config).await.expect("server should start")
}

/// Response status, content type and body text.
pub struct Fetched {
    pub status: u16,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

pub async fn fetch(server: &RunningServer, path: &str) -> Fetched {
    let url = format!("{}/{}", server.url(), path.trim_start_matches('/'));
    let response = reqwest::get(&url).await.expect("request should complete");
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let content_type = header("content-type");
    let request_id = header("x-request-id");
    let status = response.status().as_u16();
    let body = response.text().await.expect("body should be readable");
    Fetched {
        status,
        content_type,
        request_id,
        body,
    }
}
