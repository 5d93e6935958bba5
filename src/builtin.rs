//! Builtin modules
//!
//! - `bearer` ACL at `<root><acl_folder>/bearer`: accepts requests carrying
//!   `Authorization: Bearer <token>` for one of the `bearer_tokens` context
//!   settings
//! - `health` route module at `<root><base>/health`: `GET` answers
//!   `{"status": "ok", "namespace": ...}`

use crate::config::ApiConfig;
use crate::context::SharedContext;
use crate::error::RegistryError;
use crate::modules::{HandlerMap, ModuleExport, ModuleRegistry};
use crate::mount::ko_response;
use crate::pipeline::{HandlerResult, Middleware, Next, Request};
use async_trait::async_trait;
use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::debug;

/// Context setting holding the accepted bearer tokens
pub const BEARER_TOKENS_SETTING: &str = "bearer_tokens";

/// Register the builtin modules under the paths derived from `api`
pub fn register_builtin_modules(
    registry: &mut ModuleRegistry,
    api: &ApiConfig,
) -> Result<(), RegistryError> {
    registry.register(api.implicit_acl_path("bearer"), bearer_module)?;
    registry.register(format!("{}/health", api.route_root()), health_module)?;
    Ok(())
}

/// An accepted token, never printed
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Compare without short-circuiting on the first differing byte
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Middleware accepting a fixed set of bearer tokens
#[derive(Debug, Clone)]
pub struct BearerAuth {
    tokens: Vec<BearerToken>,
}

impl BearerAuth {
    pub fn new(tokens: Vec<BearerToken>) -> Self {
        Self { tokens }
    }

    fn accepts(&self, request: &Request) -> bool {
        let Some(value) = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        let Some(token) = value.strip_prefix("Bearer ") else {
            return false;
        };

        let token = token.trim();
        self.tokens.iter().any(|t| t.matches(token))
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(&self, request: Request, next: Next) -> HandlerResult {
        if !self.accepts(&request) {
            debug!(uri = %request.uri(), "Bearer token rejected");
            return Ok(ko_response(StatusCode::UNAUTHORIZED, "Unauthorized"));
        }
        Ok(next.run(request).await)
    }
}

fn bearer_module(ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
    let tokens: Vec<BearerToken> = ctx.require_setting(BEARER_TOKENS_SETTING)?;
    if tokens.is_empty() {
        anyhow::bail!("{} must list at least one token", BEARER_TOKENS_SETTING);
    }
    Ok(ModuleExport::middleware(BearerAuth::new(tokens)))
}

fn health_module(ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
    let namespace = ctx.namespace().to_string();
    let map = HandlerMap::new().on("GET", move |_request: Request| {
        let namespace = namespace.clone();
        async move {
            let body = json!({
                "status": "ok",
                "namespace": namespace,
            });
            Ok::<_, anyhow::Error>(Json(body).into_response())
        }
    })?;
    Ok(map.into())
}
