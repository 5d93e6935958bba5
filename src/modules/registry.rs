//! Module registry
//!
//! Maps logical module paths (e.g. `/api/roles`, `/ACLs/admin`) to the
//! factories that build them. The route and ACL resolvers probe this map the
//! way a filesystem would be probed: by constructed path strings.

use crate::context::SharedContext;
use crate::error::RegistryError;
use crate::modules::ModuleExport;
use std::collections::BTreeMap;
use tracing::debug;

/// A module constructor
pub type ModuleFactory = fn(&SharedContext) -> anyhow::Result<ModuleExport>;

/// Compile-time module registration entry for auto-discovery
///
/// This struct is submitted via `inventory::submit!` by the `#[module]` macro,
/// allowing modules to be registered without explicit calls.
pub struct ModuleRegistration {
    /// Registry path of the module
    pub path: &'static str,
    /// Constructor invoked by the loader
    pub factory: ModuleFactory,
}

inventory::collect!(ModuleRegistration);

/// Path → factory map
#[derive(Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `path`
    ///
    /// Paths start with `/`, have no empty segments and no trailing `/`.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        factory: ModuleFactory,
    ) -> Result<(), RegistryError> {
        let path = path.into();
        validate_path(&path)?;

        if self.factories.contains_key(&path) {
            return Err(RegistryError::Duplicate { path });
        }

        debug!(path = %path, "Registered module");
        self.factories.insert(path, factory);
        Ok(())
    }

    /// Register all modules discovered via the `#[module]` macro
    pub fn register_all_auto(&mut self) -> Result<(), RegistryError> {
        for registration in inventory::iter::<ModuleRegistration> {
            self.register(registration.path, registration.factory)?;
        }
        Ok(())
    }

    /// Get a factory by path
    pub fn get(&self, path: &str) -> Option<ModuleFactory> {
        self.factories.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.factories.contains_key(path)
    }

    /// Registered paths in lexical order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Get the number of registered modules
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

fn validate_path(path: &str) -> Result<(), RegistryError> {
    let reason = if !path.starts_with('/') {
        "must start with '/'"
    } else if path.len() > 1 && path.ends_with('/') {
        "must not end with '/'"
    } else if path.contains("//") {
        "must not contain empty segments"
    } else if path.chars().any(char::is_whitespace) {
        "must not contain whitespace"
    } else {
        return Ok(());
    };

    Err(RegistryError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::HandlerMap;

    fn empty(_ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
        Ok(HandlerMap::new().into())
    }

    #[test]
    fn test_empty_registry() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("/api/roles").is_none());
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ModuleRegistry::new();
        registry.register("/api/roles", empty).unwrap();
        registry.register("/ACLs/admin", empty).unwrap();

        assert!(registry.contains("/api/roles"));
        assert!(registry.get("/api/roles").is_some());
        assert_eq!(
            registry.paths().collect::<Vec<_>>(),
            vec!["/ACLs/admin", "/api/roles"]
        );
    }

    #[test]
    fn test_duplicate_path() {
        let mut registry = ModuleRegistry::new();
        registry.register("/api/roles", empty).unwrap();
        assert!(matches!(
            registry.register("/api/roles", empty),
            Err(RegistryError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_invalid_paths() {
        let mut registry = ModuleRegistry::new();
        for path in ["api/roles", "/api/roles/", "/api//roles", "/api/ roles"] {
            assert!(
                matches!(
                    registry.register(path, empty),
                    Err(RegistryError::InvalidPath { .. })
                ),
                "{} should be rejected",
                path
            );
        }
        assert!(registry.is_empty());
    }
}
