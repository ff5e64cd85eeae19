//! End-to-end serving over a real socket.

#![cfg(unix)]

use zulu::config::{ManifestConfig, RouteNode, ServerConfig};

mod common;

use common::{fetch, fixture, serve, serve_config, write};

#[tokio::test]
async fn pipes_root_index_through_sed() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new(".").script("sed s/world/you/g")]).await;

    let res = fetch(&server, "/").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("text/html"));
    assert_eq!(res.body, "Hello you!\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn generator_script_without_file() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new("dev/null").script("echo -n test")]).await;

    let res = fetch(&server, "/dev/null").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "test");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn generator_feeds_the_next_stage() {
    let dir = fixture();
    let route = RouteNode::new("dev/null")
        .script("cat index.html")
        .script("sed s/world/you/g");
    let server = serve(dir.path(), vec![route]).await;

    let res = fetch(&server, "/dev/null").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "Hello you!\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn missing_file_without_routes_is_404() {
    let dir = fixture();
    let server = serve(dir.path(), Vec::new()).await;

    let res = fetch(&server, "/missing.file").await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body, "Not Found: /missing.file");

    let res = fetch(&server, "/").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "Hello world!\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn glob_route_under_base_directory() {
    let dir = fixture();
    let route = RouteNode::new("public/**/*.@(jpg|png)").script("tr a-z A-Z");
    let server = serve(dir.path(), vec![route]).await;

    let res = fetch(&server, "/img/a.jpg").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(res.body, "RAW IMAGE BYTES");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn glob_claims_only_matching_paths() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new("src/*.js").script("tr a-z A-Z")]).await;

    let res = fetch(&server, "/app.js").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "LET ANSWER = 42;\n");

    // Not under src/ and not matching the glob: plain static fallback.
    let res = fetch(&server, "/index.html").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "Hello world!\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn parent_route_shadows_nested_glob() {
    let dir = fixture();
    let route = RouteNode::new("public").route(RouteNode::new("**/*.@(jpg|png)").script("tr a-z A-Z"));
    let server = serve(dir.path(), vec![route]).await;

    // "public" comes first in pre-order and holds the file.
    let res = fetch(&server, "/img/a.jpg").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "raw image bytes");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn directories_serve_their_index() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new("./")]).await;

    let res = fetch(&server, "/foo").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("text/html"));
    assert_eq!(res.body, "Foo\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn unknown_extension_is_octet_stream() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new("./")]).await;

    let res = fetch(&server, "/notes.unknownext").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(res.body, "plain bytes");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn missing_program_is_500() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new("./").script("zulu-missing-program")]).await;

    let res = fetch(&server, "/").await;
    assert_eq!(res.status, 500);
    assert!(res.body.contains("zulu-missing-program"), "{}", res.body);

    // The server keeps serving after a failed pipeline.
    let res = fetch(&server, "/").await;
    assert_eq!(res.status, 500);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn failing_filter_is_500() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new(".").script("sed s/world")]).await;

    let res = fetch(&server, "/").await;
    assert_eq!(res.status, 500);
    assert!(res.body.contains("sed s/world"), "{}", res.body);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn stage_failing_mid_stream_aborts_the_body() {
    let dir = fixture();
    let route = RouteNode::new("dev/null").script("cat index.html missing.txt");
    let server = serve(dir.path(), vec![route]).await;

    let response = reqwest::get(format!("{}/dev/null", server.url())).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.bytes().await.is_err());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn named_scripts_run_through_runner() {
    let dir = fixture();
    write(dir.path(), "package.json", r#"{ "scripts": { "imgmin": "imagemin" } }"#);

    let mut config = ServerConfig::new(dir.path(), vec![RouteNode::new("dev/null").script("imgmin --fast")]);
    config.manifest = ManifestConfig {
        runner: "echo".to_string(),
        runner_args: vec!["-n".to_string(), "via".to_string()],
        ..ManifestConfig::default()
    };
    let server = serve_config(config).await;

    let res = fetch(&server, "/dev/null").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "via imgmin --fast");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn every_response_has_a_request_id() {
    let dir = fixture();
    let server = serve(dir.path(), vec![RouteNode::new("./")]).await;

    let ok = fetch(&server, "/").await;
    let missing = fetch(&server, "/missing.file").await;
    let ok_id = ok.request_id.expect("200 should carry x-request-id");
    let missing_id = missing.request_id.expect("404 should carry x-request-id");
    assert_ne!(ok_id, missing_id);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn concurrent_pipelines_do_not_block_each_other() {
    let dir = fixture();
    let slow = RouteNode::new("slow*").script("sleep 1").script("cat");
    let fast = RouteNode::new("fast*").script("echo -n fast");
    let server = serve(dir.path(), vec![slow, fast]).await;

    let started = std::time::Instant::now();
    let (slow, fast) = tokio::join!(fetch(&server, "/slow"), async {
        let res = fetch(&server, "/fast").await;
        (res, started.elapsed())
    });
    assert_eq!(slow.status, 200);
    assert_eq!(slow.body, "");
    assert_eq!(fast.0.body, "fast");
    assert!(fast.1 < std::time::Duration::from_millis(900));

    server.stop().await.unwrap();
}
