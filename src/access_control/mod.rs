//! Access control module
//!
//! Resolves named ACLs into ordered middleware pipelines.
//!
//! ## ACL Model
//!
//! An ACL is declared in `[api.acls]` in one of three ways:
//!
//! 1. **Implicit** (`true`) - module at `root + acl_folder + "/" + name`
//! 2. **Explicit** (`"/some/path"`) - module at `root + path`
//! 3. **Chain** (`[...]`) - each entry is a single ACL name or an explicit path
//!
//! ## Example Configuration
//!
//! ```toml
//! [api.acls]
//! admin = true                    # /ACLs/admin
//! audit = "/lib/audit"            # explicit module path
//! staff = ["admin", "/lib/audit"] # admin first, then audit
//! ```
//!
//! Routes without an ACL run behind [`NO_ACL`], a passthrough that always
//! continues.

pub mod resolver;

pub use resolver::{AclEntry, AclKind, AclResolver, AclTable};

/// Name of the always-present passthrough ACL
pub const NO_ACL: &str = "__NoACL__";
