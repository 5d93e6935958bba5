//! Router composition
//!
//! [`mount_api`] runs the whole boot sequence for one API:
//!
//! 1. Resolve every ACL into a middleware pipeline
//! 2. Parse every route, check its ACL, method and path
//! 3. Search the handler of every route (missing ones are reported, not fatal)
//! 4. Compose the per-ACL sub-routers under the base prefix
//!
//! The resulting layer stack, outermost first:
//!
//! ```text
//! not-found interceptor   (empty 404/405 under base → structured 404)
//!   trace layer
//!     error interceptor   (Err results and panics → structured 500)
//!       /<base>/<acl>/... ACL pipeline → handler
//! ```

pub mod intercept;
pub mod mounter;

pub use intercept::{ErrorDetail, NotFoundScope, ko_response};
pub use mounter::{PipelineMounter, method_filter};

use crate::access_control::AclResolver;
use crate::config::{ApiConfig, AppConfig, PRODUCTION_PROFILE};
use crate::context::SharedContext;
use crate::error::{MountError, MountResult};
use crate::modules::{MethodMatch, ModuleLoader, ModuleRegistry};
use crate::routes::{RouteResolver, RouteSpec};
use axum::Router;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

/// A route that was mounted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedRoute {
    pub acl: String,
    pub method: String,
    pub path: String,
    /// Full URL template the route answers on
    pub url: String,
    /// Module that served the handler
    pub file_path: String,
    pub sub_path: String,
    pub label: String,
}

/// A route whose handler could not be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingRoute {
    pub acl: String,
    pub method: String,
    pub path: String,
}

/// Outcome of a mount pass
#[derive(Debug, Clone, Default)]
pub struct MountReport {
    pub acls: Vec<String>,
    pub mounted: Vec<MountedRoute>,
    pub missing: Vec<MissingRoute>,
}

impl MountReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// The composed router and how it was built
pub struct MountedApi {
    router: Router,
    report: MountReport,
}

impl MountedApi {
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn report(&self) -> &MountReport {
        &self.report
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    pub fn into_parts(self) -> (Router, MountReport) {
        (self.router, self.report)
    }
}

/// Mount an application's API using its active profile
pub fn mount_app(
    config: &AppConfig,
    registry: Arc<ModuleRegistry>,
    context: SharedContext,
) -> MountResult<MountedApi> {
    mount_api(&config.api, &config.profile, registry, context)
}

/// Resolve and compose the router for `api`
///
/// `profile` selects the error detail: `production` renders only the error
/// message, anything else the full chain.
#[instrument(skip_all, fields(base = %api.base, profile = %profile))]
pub fn mount_api(
    api: &ApiConfig,
    profile: &str,
    registry: Arc<ModuleRegistry>,
    context: SharedContext,
) -> MountResult<MountedApi> {
    let loader = ModuleLoader::new(registry, context);
    let table = AclResolver::new(api, &loader).resolve()?;

    let specs = api
        .routes
        .iter()
        .map(RouteSpec::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let mut mounter = PipelineMounter::new(api.acl_path_prefix);
    let mut methods = Vec::with_capacity(specs.len());
    for spec in &specs {
        if !table.contains(&spec.acl) {
            return Err(MountError::UnknownAcl {
                acl: spec.acl.clone(),
                route: spec.to_string(),
            });
        }
        let (method, filter) = method_filter(spec)?;
        mounter.claim(spec, &method)?;
        methods.push((method, filter));
    }

    let resolver = RouteResolver::new(
        &loader,
        api.route_root(),
        MethodMatch::from_case_sensitive(api.case_sensitive_methods),
    );

    let mut report = MountReport {
        acls: table.names().map(str::to_string).collect(),
        ..Default::default()
    };

    for (spec, (method, filter)) in specs.iter().zip(methods) {
        match resolver.resolve(&spec.method, &spec.path) {
            Some(resolved) => {
                report.mounted.push(MountedRoute {
                    acl: spec.acl.clone(),
                    method: method.to_string(),
                    path: spec.path.clone(),
                    url: format!("{}{}", api.base, mounter.effective_path(spec)),
                    file_path: resolved.file_path,
                    sub_path: resolved.sub_path,
                    label: resolved.label,
                });
                mounter.add(spec, filter, resolved.handler);
            }
            None => report.missing.push(MissingRoute {
                acl: spec.acl.clone(),
                method: spec.method.clone(),
                path: spec.path.clone(),
            }),
        }
    }

    let tree = mounter.build(&table)?;
    let router = compose(tree, &api.base, profile == PRODUCTION_PROFILE);

    info!(
        acls = report.acls.len(),
        mounted = report.mounted.len(),
        missing = report.missing.len(),
        "API mounted"
    );
    if !report.is_complete() {
        warn!(missing = report.missing.len(), "Some routes have no handler");
    }

    Ok(MountedApi { router, report })
}

/// Wrap a composed tree in the interception layers and mount it at `base`
fn compose(tree: Router, base: &str, is_production: bool) -> Router {
    let api = tree
        .layer(from_fn_with_state(
            ErrorDetail::for_production(is_production),
            intercept::intercept_errors,
        ))
        .layer(TraceLayer::new_for_http());

    let root = if base.is_empty() {
        api
    } else {
        Router::new().nest(base, api)
    };

    root.fallback(|| async { StatusCode::NOT_FOUND })
        .layer(from_fn_with_state(
            NotFoundScope::new(base),
            intercept::intercept_not_found,
        ))
}
