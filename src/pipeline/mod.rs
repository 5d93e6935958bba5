//! Middleware and handler model
//!
//! A [`Middleware`] receives the request and a [`Next`] continuation. It may
//! call `next.run(request)` to continue down the chain (and post-process the
//! response on the way back), or return its own response to short-circuit.
//! A [`Handler`] terminates the chain.
//!
//! Both return `anyhow::Result<Response>`; an `Err` never escapes the router,
//! it is turned into a 500 by the error-interception layer.
//!
//! ```text
//! request → mw[0] → mw[1] → … → handler
//! response ←──────────────────────┘
//! ```

mod failure;

pub use failure::{RequestFailure, failure_response};

// async_trait required for dyn-compatibility with Arc<dyn Middleware> / Arc<dyn Handler>
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

pub use axum::extract::Request;
pub use axum::middleware::Next;
pub use axum::response::Response;

/// Result of a middleware or handler
pub type HandlerResult = anyhow::Result<Response>;

/// Type-erased middleware as stored in ACL pipelines
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Type-erased handler as stored in handler maps
pub type BoxedHandler = Arc<dyn Handler>;

/// A pipeline stage with a continue-to-next capability
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request, optionally delegating to `next`
    async fn handle(&self, request: Request, next: Next) -> HandlerResult;
}

/// The terminal stage of a pipeline
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, request: Request) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, request: Request, next: Next) -> HandlerResult {
        (self)(request, next).await
    }
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn call(&self, request: Request) -> HandlerResult {
        (self)(request).await
    }
}

/// Middleware that performs no check and always continues
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl Middleware for Passthrough {
    async fn handle(&self, request: Request, next: Next) -> HandlerResult {
        Ok(next.run(request).await)
    }
}
