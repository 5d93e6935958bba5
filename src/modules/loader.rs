//! Module loader
//!
//! Invokes registered factories with the shared context and memoizes the
//! outcome per path. A factory runs at most once, even when it fails; later
//! lookups of a failed path report the cached failure.

use crate::context::SharedContext;
use crate::error::LoadError;
use crate::modules::{ModuleExport, ModuleRegistry};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, trace, warn};

type Outcome = Result<Arc<ModuleExport>, String>;

/// Memoizing front of a [`ModuleRegistry`]
pub struct ModuleLoader {
    registry: Arc<ModuleRegistry>,
    context: SharedContext,
    cache: Mutex<HashMap<String, Arc<OnceLock<Outcome>>>>,
}

impl ModuleLoader {
    pub fn new(registry: Arc<ModuleRegistry>, context: SharedContext) -> Self {
        Self {
            registry,
            context,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The context handed to factories
    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// Load a module, `None` when absent or broken
    pub fn load(&self, path: &str) -> Option<Arc<ModuleExport>> {
        match self.load_strict(path) {
            Ok(export) => Some(export),
            Err(LoadError::NotFound { .. }) => {
                trace!(path = %path, "No module registered");
                None
            }
            Err(e) => {
                debug!(path = %path, error = %e, "Module unavailable");
                None
            }
        }
    }

    /// Load a module, distinguishing absence from factory failure
    pub fn load_strict(&self, path: &str) -> Result<Arc<ModuleExport>, LoadError> {
        let factory = self.registry.get(path).ok_or_else(|| LoadError::NotFound {
            path: path.to_string(),
        })?;

        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(cache.entry(path.to_string()).or_default())
        };

        // Initialized outside the map lock so factories may load other modules
        let outcome = cell.get_or_init(|| match factory(&self.context) {
            Ok(export) => {
                debug!(path = %path, kind = export.kind(), "Loaded module");
                Ok(Arc::new(export))
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Module factory failed");
                Err(format!("{:#}", e))
            }
        });

        outcome.clone().map_err(|reason| LoadError::Factory {
            path: path.to_string(),
            reason,
        })
    }

    /// Number of paths whose factory has been resolved
    pub fn cached(&self) -> usize {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.values().filter(|cell| cell.get().is_some()).count()
    }
}
