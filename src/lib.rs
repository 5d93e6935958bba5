//! switchyard
//!
//! Configuration-driven route mounting for axum with named ACL pipelines.
//!
//! ## Features
//!
//! - **Convention-based handler discovery**: a route's handler is searched in
//!   a module registry by longest path prefix, the remainder of the path
//!   becoming part of the handler label
//! - **Named ACLs**: single middleware or ordered chains, resolved once at boot
//! - **Layered configuration** via TOML files, environment variables and
//!   per-profile layers
//! - **Structured error bodies** for handler failures and unmatched URLs
//!
//! ## Request Flow
//!
//! ```text
//! /api/<acl>/<path> → ACL pipeline (mw[0] → mw[1] → …) → handler
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [api]
//! base = "/api"
//! routes = [
//!     "GET /health",
//!     "admin GET /roles/:id",
//! ]
//!
//! [api.acls]
//! admin = true                    # module at /ACLs/admin
//! ```
//!
//! ## Defining Modules
//!
//! ```ignore
//! use switchyard::{HandlerMap, ModuleExport, SharedContext};
//!
//! #[switchyard::module(path = "/api/roles")]
//! fn roles(_ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
//!     Ok(HandlerMap::new().on("GET", show_role)?.into())
//! }
//! ```

pub mod access_control;
#[cfg(feature = "builtin")]
pub mod builtin;
pub mod config;
pub mod context;
pub mod error;
pub mod modules;
pub mod mount;
pub mod pipeline;
pub mod routes;
pub mod transport;

// Used by the `#[module]` macro expansion
#[doc(hidden)]
pub use inventory;

pub use switchyard_macros::module;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use context::SharedContext;
pub use modules::{HandlerMap, ModuleExport, ModuleRegistry};
pub use mount::{MountReport, MountedApi, mount_api, mount_app};
pub use pipeline::{Handler, Middleware};
