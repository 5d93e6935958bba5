//! Transport layer tests
//!
//! Tests for HTTP configuration and serving a mounted router.

use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use switchyard::error::TransportError;
use switchyard::transport::{DEFAULT_HTTP_PORT, HttpConfig, run_http};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[test]
fn test_http_config_default() {
    let config = HttpConfig::default();
    assert_eq!(
        config.bind,
        SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT))
    );
}

#[test]
fn test_http_config_from_host_port() {
    let config = HttpConfig::from_host_port("127.0.0.1", 9000).unwrap();

    assert_eq!(config.bind.port(), 9000);
    assert_eq!(config.bind.ip().to_string(), "127.0.0.1");
}

#[test]
fn test_http_config_from_host_port_ipv6() {
    // IPv6 addresses need brackets in the format string for parsing
    let config = HttpConfig::from_host_port("[::1]", 8080).unwrap();

    assert_eq!(config.bind.port(), 8080);
    assert!(config.bind.ip().is_ipv6());
}

#[test]
fn test_http_config_from_host_port_invalid() {
    let result = HttpConfig::from_host_port("not-an-ip", 8080);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_serve_and_shutdown() {
    let router = Router::new().route("/ping", get(|| async { "pong" }));
    let config = HttpConfig::from_host_port("127.0.0.1", 0).unwrap();

    let server = run_http(router, config).await.unwrap();
    assert_ne!(server.local_addr.port(), 0);

    let mut stream = TcpStream::connect(server.local_addr).await.unwrap();
    stream
        .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("pong"));

    server.shutdown.cancel();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_bind_conflict() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let result = run_http(Router::new(), HttpConfig::new(addr)).await;
    assert!(matches!(result, Err(TransportError::Bind { .. })));

    drop(listener);
}
