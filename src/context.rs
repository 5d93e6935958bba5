//! Shared context handed to every module factory
//!
//! The context replaces ambient globals: whatever a module needs at
//! construction time (settings, database pools, clients) is put here once by
//! the application and passed explicitly to each factory.

use crate::config::ContextConfig;
use crate::error::ModuleError;
use axum::http::Extensions;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Immutable, cheaply clonable dependency-injection container
#[derive(Clone, Default)]
pub struct SharedContext {
    inner: Arc<ContextInner>,
}

#[derive(Default)]
struct ContextInner {
    namespace: String,
    settings: Map<String, Value>,
    extensions: Extensions,
}

impl SharedContext {
    /// Start building a context
    pub fn builder() -> SharedContextBuilder {
        SharedContextBuilder::default()
    }

    /// Build a context from the `[context]` configuration section
    pub fn from_config(config: &ContextConfig) -> Self {
        Self::builder()
            .namespace(&config.namespace)
            .settings(config.settings.clone())
            .build()
    }

    /// Label attached to log events for this API
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Raw setting value
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.inner.settings.get(key)
    }

    /// Setting deserialized into `T`, `Ok(None)` when absent
    pub fn setting_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ModuleError> {
        match self.inner.settings.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                ModuleError::InvalidSetting {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Setting deserialized into `T`, failing when absent
    pub fn require_setting<T: DeserializeOwned>(&self, key: &str) -> Result<T, ModuleError> {
        self.setting_as(key)?.ok_or_else(|| ModuleError::MissingSetting {
            key: key.to_string(),
        })
    }

    /// Typed value injected by the application
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.extensions.get::<T>()
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("namespace", &self.inner.namespace)
            .field("settings", &self.inner.settings.keys().collect::<Vec<_>>())
            .field("extensions", &self.inner.extensions.len())
            .finish()
    }
}

/// Builder for [`SharedContext`]
#[derive(Default)]
pub struct SharedContextBuilder {
    inner: ContextInner,
}

impl SharedContextBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.inner.namespace = namespace.into();
        self
    }

    pub fn settings(mut self, settings: Map<String, Value>) -> Self {
        self.inner.settings = settings;
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inner.settings.insert(key.into(), value);
        self
    }

    /// Inject a typed value, replacing any previous value of the same type
    pub fn insert<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.inner.extensions.insert(value);
        self
    }

    pub fn build(self) -> SharedContext {
        SharedContext {
            inner: Arc::new(self.inner),
        }
    }
}
