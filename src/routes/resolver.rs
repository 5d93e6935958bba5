//! Handler discovery
//!
//! Longest-prefix search with sub-path accumulation. For route root `/api`
//! and `GET /users/42/profile` the probes are:
//!
//! ```text
//! /api/users/42/profile   GET
//! /api/users/42           GET /profile
//! /api/users              GET /42/profile
//! /api                    GET /users/42/profile
//! ```
//!
//! The search stops at the first module whose handler map has a matching
//! label, or once the probed path would leave the route root.

use crate::modules::{MethodMatch, ModuleLoader};
use crate::pipeline::BoxedHandler;
use std::fmt;
use tracing::{debug, trace, warn};

/// A handler found for a route, with where it was found
#[derive(Clone)]
pub struct ResolvedHandler {
    pub handler: BoxedHandler,
    /// Registry path of the module that served it
    pub file_path: String,
    /// Accumulated sub-path used in the label (empty for a direct hit)
    pub sub_path: String,
    /// The matched label
    pub label: String,
}

impl fmt::Debug for ResolvedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHandler")
            .field("file_path", &self.file_path)
            .field("sub_path", &self.sub_path)
            .field("label", &self.label)
            .finish()
    }
}

/// Locates handlers under a route root
pub struct RouteResolver<'a> {
    loader: &'a ModuleLoader,
    route_root: String,
    mode: MethodMatch,
}

impl<'a> RouteResolver<'a> {
    pub fn new(loader: &'a ModuleLoader, route_root: impl Into<String>, mode: MethodMatch) -> Self {
        Self {
            loader,
            route_root: route_root.into(),
            mode,
        }
    }

    pub fn route_root(&self) -> &str {
        &self.route_root
    }

    /// Find the handler for `method` on `route_path`, `None` when there is none
    pub fn resolve(&self, method: &str, route_path: &str) -> Option<ResolvedHandler> {
        let mut file_path = format!("{}{}", self.route_root, route_path);
        let mut sub_path = String::new();

        loop {
            trace!(file_path = %file_path, method = %method, sub_path = %sub_path, "Searching handler");

            if let Some(export) = self.loader.load(&file_path)
                && let Some(handlers) = export.as_handlers()
                && let Some(picked) = handlers.pick(method, &sub_path, self.mode)
            {
                debug!(file_path = %file_path, label = %picked.label, "Found handler");
                return Some(ResolvedHandler {
                    handler: picked.handler,
                    file_path,
                    sub_path,
                    label: picked.label,
                });
            }

            let Some(index) = file_path.rfind('/') else {
                break;
            };
            sub_path.insert_str(0, &file_path[index..]);
            file_path.truncate(index);

            if !file_path.starts_with(&self.route_root) {
                break;
            }
        }

        warn!(method = %method, path = %route_path, route_root = %self.route_root, "Cannot find handler");
        None
    }
}
