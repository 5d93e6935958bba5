//! HTTP transport
//!
//! Serves a mounted router over HTTP.

use crate::error::TransportError;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Default port for the HTTP listener
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:8080")
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with the specified bind address
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self::new(addr))
    }
}

/// A running server
pub struct HttpServer {
    /// Address actually bound (differs from the config when port 0 was asked)
    pub local_addr: SocketAddr,
    /// Cancel to stop accepting connections and drain in-flight requests
    pub shutdown: CancellationToken,
    /// Completes once the server has stopped
    pub handle: tokio::task::JoinHandle<Result<(), TransportError>>,
}

/// Bind and serve `router` in the background
pub async fn run_http(router: Router, config: HttpConfig) -> Result<HttpServer, TransportError> {
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| TransportError::Bind {
            addr: config.bind.to_string(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    info!("HTTP server listening on http://{}", local_addr);

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(TransportError::from)
    });

    Ok(HttpServer {
        local_addr,
        shutdown,
        handle,
    })
}

/// Serve `router` until Ctrl+C
pub async fn run_http_blocking(router: Router, config: HttpConfig) -> anyhow::Result<()> {
    let server = run_http(router, config).await?;

    info!("Press Ctrl+C to stop the server");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        _ = server.shutdown.cancelled() => {
            info!("Server cancelled");
        }
    }

    server.shutdown.cancel();
    server.handle.await??;

    info!("HTTP server stopped");
    Ok(())
}
