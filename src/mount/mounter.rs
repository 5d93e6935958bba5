//! Pipeline mounter
//!
//! Collects resolved routes into one sub-router per ACL and composes them
//! into a single router tree.

use crate::access_control::{AclTable, NO_ACL};
use crate::error::{MountError, MountResult};
use crate::pipeline::{BoxedHandler, BoxedMiddleware, Next, Request, failure_response};
use crate::routes::RouteSpec;
use axum::Router;
use axum::http::Method;
use axum::routing::{MethodFilter, MethodRouter};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Parse a configured method into axum's method filter
pub fn method_filter(spec: &RouteSpec) -> MountResult<(Method, MethodFilter)> {
    let unsupported = || MountError::UnsupportedMethod {
        method: spec.method.clone(),
        route: spec.to_string(),
    };

    let method = Method::from_bytes(spec.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| unsupported())?;
    let filter = MethodFilter::try_from(method.clone()).map_err(|_| unsupported())?;
    Ok((method, filter))
}

struct Claim {
    acl: String,
    path: String,
}

/// Builds the per-ACL router tree
pub struct PipelineMounter {
    acl_path_prefix: bool,
    routers: BTreeMap<String, BTreeMap<String, MethodRouter>>,
    claims: HashMap<String, Claim>,
    methods: HashSet<(String, Method)>,
}

impl PipelineMounter {
    pub fn new(acl_path_prefix: bool) -> Self {
        Self {
            acl_path_prefix,
            routers: BTreeMap::new(),
            claims: HashMap::new(),
            methods: HashSet::new(),
        }
    }

    /// Path a route answers on, relative to the API base
    pub fn effective_path(&self, spec: &RouteSpec) -> String {
        let path = spec.axum_path();
        if !spec.has_acl() || !self.acl_path_prefix {
            return path;
        }
        if path == "/" {
            format!("/{}", spec.acl)
        } else {
            format!("/{}{}", spec.acl, path)
        }
    }

    /// Reserve the route's effective path and method
    ///
    /// Fails when the method is already taken on that path, when another ACL
    /// owns the path, or when the path overlaps one with other parameter names.
    pub fn claim(&mut self, spec: &RouteSpec, method: &Method) -> MountResult<()> {
        let path = self.effective_path(spec);
        let shape = path_shape(&path);

        if let Some(claim) = self.claims.get(&shape) {
            if claim.acl != spec.acl {
                return Err(MountError::PathConflict {
                    path,
                    acl: spec.acl.clone(),
                    other: claim.acl.clone(),
                });
            }
            if claim.path != path {
                return Err(MountError::AmbiguousRoute {
                    path,
                    other: claim.path.clone(),
                });
            }
        }

        if !self.methods.insert((shape.clone(), method.clone())) {
            return Err(MountError::DuplicateRoute {
                method: method.to_string(),
                path,
            });
        }

        self.claims.entry(shape).or_insert_with(|| Claim {
            acl: spec.acl.clone(),
            path: path.clone(),
        });
        Ok(())
    }

    /// Add a resolved handler to its ACL's sub-router
    pub fn add(&mut self, spec: &RouteSpec, filter: MethodFilter, handler: BoxedHandler) {
        let route = move |request: Request| {
            let handler = Arc::clone(&handler);
            async move {
                handler
                    .call(request)
                    .await
                    .unwrap_or_else(failure_response)
            }
        };

        let paths = self.routers.entry(spec.acl.clone()).or_default();
        let path = spec.axum_path();
        let method_router = paths
            .remove(&path)
            .unwrap_or_else(MethodRouter::new)
            .on(filter, route);
        trace!(acl = %spec.acl, path = %path, "Mounted route");
        paths.insert(path, method_router);
    }

    /// Compose the sub-routers, each wrapped in its ACL pipeline
    pub fn build(self, table: &AclTable) -> MountResult<Router> {
        let mut tree = Router::new();

        for acl in table.names() {
            if !self.routers.contains_key(acl) {
                debug!(acl = %acl, "No routes behind ACL, skipping");
            }
        }

        for (acl, paths) in self.routers {
            let entry = table.get(&acl).ok_or_else(|| MountError::UnknownAcl {
                acl: acl.clone(),
                route: paths.keys().cloned().collect::<Vec<_>>().join(", "),
            })?;

            let mut router = Router::new();
            for (path, method_router) in paths {
                router = router.route(&path, guarded(method_router, &entry.pipeline));
            }

            if acl == NO_ACL || !self.acl_path_prefix {
                tree = tree.merge(router);
            } else {
                tree = tree.nest(&format!("/{}", acl), router);
            }
            debug!(acl = %acl, kind = %entry.kind, "Composed ACL router");
        }

        Ok(tree)
    }
}

/// Wrap a path's method routes in an ACL pipeline
///
/// Only the registered methods are layered; the method-not-allowed fallback
/// stays outside the pipeline and never runs the ACL.
fn guarded(mut method_router: MethodRouter, pipeline: &[BoxedMiddleware]) -> MethodRouter {
    // Last layer added runs first, so element 0 ends up outermost
    for middleware in pipeline.iter().rev() {
        let middleware = Arc::clone(middleware);
        method_router = method_router.route_layer(axum::middleware::from_fn(
            move |request: Request, next: Next| {
                let middleware = Arc::clone(&middleware);
                async move {
                    middleware
                        .handle(request, next)
                        .await
                        .unwrap_or_else(failure_response)
                }
            },
        ));
    }
    method_router
}

/// Path with parameter names erased, used to detect overlapping templates
fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
