//! Startup failures and shutdown.

use zulu::config::{ConfigError, RouteNode, ServerConfig};
use zulu::StartupError;

mod common;

#[tokio::test]
async fn route_without_path_is_rejected() {
    let dir = common::fixture();
    let routes = vec![RouteNode::new("public").route(RouteNode::default().script("cat"))];

    let err = zulu::start(ServerConfig::new(dir.path(), routes)).await.err().unwrap();
    match err {
        StartupError::Config(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].to_string(), "route routes[0].routes[0] must have a path");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_root_is_rejected() {
    let dir = common::fixture();
    let config = ServerConfig::new(dir.path().join("missing"), vec![RouteNode::new("./")]);

    let err = zulu::start(config).await.err().unwrap();
    assert!(matches!(err, StartupError::Config(ConfigError::Root { .. })));
}

#[tokio::test]
async fn malformed_manifest_is_rejected() {
    let dir = common::fixture();
    common::write(dir.path(), "package.json", "{ not json");

    let err = zulu::start(ServerConfig::new(dir.path(), vec![RouteNode::new("./")]))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StartupError::Config(ConfigError::Manifest { .. })));
}

#[tokio::test]
async fn port_in_use_is_rejected() {
    let dir = common::fixture();
    let first = common::serve(dir.path(), vec![RouteNode::new("./")]).await;

    let mut config = ServerConfig::new(dir.path(), vec![RouteNode::new("./")]);
    config.listener.port = first.local_addr().port();
    let err = zulu::start(config).await.err().unwrap();
    assert!(matches!(err, StartupError::Listener(_)));

    first.stop().await.unwrap();
}

#[tokio::test]
async fn stops_accepting_after_shutdown() {
    let dir = common::fixture();
    let server = common::serve(dir.path(), vec![RouteNode::new("./")]).await;
    let url = server.url();

    assert_eq!(common::fetch(&server, "/").await.status, 200);
    server.stop().await.unwrap();

    assert!(reqwest::get(&url).await.is_err());
}
