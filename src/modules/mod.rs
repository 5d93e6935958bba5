//! Module registry and loader
//!
//! A *module* is a factory registered under a logical path. ACL modules
//! export a single [`Middleware`](crate::pipeline::Middleware); route modules
//! export a [`HandlerMap`] keyed by `"METHOD[ sub/path]"` labels.
//!
//! Modules are registered either explicitly:
//!
//! ```ignore
//! registry.register("/api/roles", roles_module)?;
//! ```
//!
//! or with the attribute macro, collected by [`ModuleRegistry::register_all_auto`]:
//!
//! ```ignore
//! #[switchyard::module(path = "/api/roles")]
//! fn roles_module(ctx: &SharedContext) -> anyhow::Result<ModuleExport> { ... }
//! ```

pub mod export;
pub mod loader;
pub mod registry;

pub use export::{HandlerMap, MethodMatch, ModuleExport, PickedHandler};
pub use loader::ModuleLoader;
pub use registry::{ModuleFactory, ModuleRegistration, ModuleRegistry};
