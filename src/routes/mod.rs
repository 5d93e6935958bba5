//! Route specifications and handler discovery

pub mod resolver;
pub mod spec;

pub use resolver::{ResolvedHandler, RouteResolver};
pub use spec::{RouteSpec, to_axum_path};
