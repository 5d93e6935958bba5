//! Transport module
//!
//! Binds and serves the composed router.

pub mod http;

pub use http::{DEFAULT_HTTP_PORT, HttpConfig, HttpServer, run_http, run_http_blocking};
