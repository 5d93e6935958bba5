//! ACL resolver
//!
//! Turns the configured ACL definitions into ordered middleware pipelines in
//! two passes:
//! 1. Single ACLs (implicit or explicit module path) are loaded
//! 2. Chains are assembled from pass-1 singles or explicit module paths
//!
//! Chains may therefore name singles declared anywhere in the table. Every
//! failure aborts resolution and names the offending ACL or chain entry.

use crate::access_control::NO_ACL;
use crate::config::{AclDefinition, ApiConfig};
use crate::error::{AclError, LoadError};
use crate::modules::ModuleLoader;
use crate::pipeline::{BoxedMiddleware, Passthrough};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// How an ACL entry was built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclKind {
    /// One middleware loaded from a module path
    Single,
    /// Ordered list of middleware
    Chain,
    /// The built-in no-ACL entry
    Passthrough,
}

impl fmt::Display for AclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclKind::Single => write!(f, "single"),
            AclKind::Chain => write!(f, "chain"),
            AclKind::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// A resolved ACL
#[derive(Clone)]
pub struct AclEntry {
    pub name: String,
    pub kind: AclKind,
    /// Middleware in execution order, never empty
    pub pipeline: Vec<BoxedMiddleware>,
}

impl fmt::Debug for AclEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AclEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("pipeline", &self.pipeline.len())
            .finish()
    }
}

/// ACL name → resolved pipeline
#[derive(Debug, Clone, Default)]
pub struct AclTable {
    entries: BTreeMap<String, AclEntry>,
}

impl AclTable {
    pub fn get(&self, name: &str) -> Option<&AclEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AclEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: AclEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }
}

/// Resolves `api.acls` against a [`ModuleLoader`]
pub struct AclResolver<'a> {
    api: &'a ApiConfig,
    loader: &'a ModuleLoader,
}

impl<'a> AclResolver<'a> {
    pub fn new(api: &'a ApiConfig, loader: &'a ModuleLoader) -> Self {
        Self { api, loader }
    }

    /// Run both passes and add the no-ACL passthrough
    #[instrument(skip(self), fields(acls = self.api.acls.len()))]
    pub fn resolve(&self) -> Result<AclTable, AclError> {
        let mut table = AclTable::default();

        for (name, definition) in &self.api.acls {
            let path = match definition {
                AclDefinition::Chain(_) => continue,
                AclDefinition::Implicit(true) => self.api.implicit_acl_path(name),
                AclDefinition::Implicit(false) => {
                    return Err(AclError::InvalidDefinition {
                        acl: name.clone(),
                        reason: "false is not a valid ACL definition".to_string(),
                    });
                }
                AclDefinition::Explicit(path) => self.api.explicit_path(path),
            };

            let middleware = self.load_single(name, &path)?;
            debug!(acl = %name, path = %path, "Loaded single ACL");
            table.insert(AclEntry {
                name: name.clone(),
                kind: AclKind::Single,
                pipeline: vec![middleware],
            });
        }

        for (name, definition) in &self.api.acls {
            let AclDefinition::Chain(entries) = definition else {
                continue;
            };

            if entries.is_empty() {
                return Err(AclError::InvalidDefinition {
                    acl: name.clone(),
                    reason: "chain must not be empty".to_string(),
                });
            }

            let mut pipeline = Vec::with_capacity(entries.len());
            for entry in entries {
                pipeline.push(self.load_chain_entry(name, entry.trim(), &table)?);
            }

            debug!(acl = %name, length = pipeline.len(), "Loaded chain ACL");
            table.insert(AclEntry {
                name: name.clone(),
                kind: AclKind::Chain,
                pipeline,
            });
        }

        table.insert(AclEntry {
            name: NO_ACL.to_string(),
            kind: AclKind::Passthrough,
            pipeline: vec![Arc::new(Passthrough)],
        });

        Ok(table)
    }

    fn load_single(&self, acl: &str, path: &str) -> Result<BoxedMiddleware, AclError> {
        let export = self.loader.load_strict(path).map_err(|e| match e {
            LoadError::NotFound { path } => AclError::NotFound {
                acl: acl.to_string(),
                path,
            },
            LoadError::Factory { reason, .. } => AclError::WrongFormat {
                acl: acl.to_string(),
                reason,
            },
        })?;

        export
            .as_middleware()
            .cloned()
            .ok_or_else(|| AclError::NotMiddleware {
                acl: acl.to_string(),
                path: path.to_string(),
                found: export.kind(),
            })
    }

    fn load_chain_entry(
        &self,
        acl: &str,
        entry: &str,
        singles: &AclTable,
    ) -> Result<BoxedMiddleware, AclError> {
        if let Some(single) = singles.get(entry) {
            if single.kind != AclKind::Single {
                return Err(AclError::InvalidDefinition {
                    acl: acl.to_string(),
                    reason: format!("chain entry {} is itself a chain", entry),
                });
            }
            return Ok(Arc::clone(&single.pipeline[0]));
        }

        if let Some(AclDefinition::Chain(_)) = self.api.acls.get(entry) {
            return Err(AclError::InvalidDefinition {
                acl: acl.to_string(),
                reason: format!("chain entry {} is itself a chain", entry),
            });
        }

        let path = self.api.explicit_path(entry);
        let export = self.loader.load_strict(&path).map_err(|e| match e {
            LoadError::NotFound { path } => AclError::ChainEntryNotFound {
                acl: acl.to_string(),
                entry: entry.to_string(),
                path,
            },
            LoadError::Factory { reason, .. } => AclError::ChainEntryWrongFormat {
                acl: acl.to_string(),
                entry: entry.to_string(),
                reason,
            },
        })?;

        export
            .as_middleware()
            .cloned()
            .ok_or_else(|| AclError::ChainEntryNotMiddleware {
                acl: acl.to_string(),
                entry: entry.to_string(),
                found: export.kind(),
            })
    }
}
