//! Configuration types for switchyard
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Profile whose error bodies carry the short message instead of the full chain
pub const PRODUCTION_PROFILE: &str = "production";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Active environment profile (e.g., "development", "production")
    pub profile: String,

    /// HTTP listener settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Values handed to every module factory
    pub context: ContextConfig,

    /// Route and ACL mounting configuration
    pub api: ApiConfig,

    /// Per-profile layers merged over `api`
    pub profiles: BTreeMap<String, ApiLayer>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: "development".to_string(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            context: ContextConfig::default(),
            api: ApiConfig::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Whether the active profile is the production profile
    pub fn is_production(&self) -> bool {
        self.profile == PRODUCTION_PROFILE
    }

    /// Merge the active profile's layer (if any) into `api`
    ///
    /// Scalars are overridden, ACLs are overridden by key and routes are
    /// appended after the base routes.
    pub fn apply_profile(&mut self) {
        if let Some(layer) = self.profiles.get(&self.profile) {
            self.api.apply(layer);
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared context configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Label attached to log events emitted for this API
    pub namespace: String,

    /// Free-form settings readable by module factories
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            namespace: "japi".to_string(),
            settings: serde_json::Map::new(),
        }
    }
}

/// Route and ACL mounting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Registry namespace all module paths are resolved under
    pub root: String,

    /// URL prefix the API is mounted at
    pub base: String,

    /// Folder (under `root`) holding implicitly-pathed ACL modules
    pub acl_folder: String,

    /// ACL definitions by name
    pub acls: BTreeMap<String, AclDefinition>,

    /// Routes to mount, in order
    pub routes: Vec<RouteEntry>,

    /// Compare handler label methods case-sensitively
    pub case_sensitive_methods: bool,

    /// Nest every named ACL's routes under `/<acl name>`
    pub acl_path_prefix: bool,

    /// Register the builtin bearer ACL and health module
    pub builtin_modules: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            base: "/api".to_string(),
            acl_folder: "/ACLs".to_string(),
            acls: BTreeMap::new(),
            routes: Vec::new(),
            case_sensitive_methods: false,
            acl_path_prefix: true,
            builtin_modules: true,
        }
    }
}

impl ApiConfig {
    /// Registry path the route search starts from and never climbs above
    pub fn route_root(&self) -> String {
        format!("{}{}", self.root, self.base)
    }

    /// Registry path of an ACL declared with `true`
    pub fn implicit_acl_path(&self, name: &str) -> String {
        format!("{}{}/{}", self.root, self.acl_folder, name)
    }

    /// Registry path of an explicitly-pathed ACL or chain entry
    pub fn explicit_path(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    fn apply(&mut self, layer: &ApiLayer) {
        if let Some(root) = &layer.root {
            self.root = root.clone();
        }
        if let Some(base) = &layer.base {
            self.base = base.clone();
        }
        if let Some(acl_folder) = &layer.acl_folder {
            self.acl_folder = acl_folder.clone();
        }
        if let Some(value) = layer.case_sensitive_methods {
            self.case_sensitive_methods = value;
        }
        if let Some(value) = layer.acl_path_prefix {
            self.acl_path_prefix = value;
        }
        if let Some(value) = layer.builtin_modules {
            self.builtin_modules = value;
        }
        // Chains concatenate with the base chain; any other definition replaces it
        for (name, definition) in &layer.acls {
            match (self.acls.get_mut(name), definition) {
                (Some(AclDefinition::Chain(base)), AclDefinition::Chain(extra)) => {
                    base.extend(extra.iter().cloned());
                }
                _ => {
                    self.acls.insert(name.clone(), definition.clone());
                }
            }
        }
        self.routes.extend(layer.routes.iter().cloned());
    }
}

/// Profile-specific overrides of [`ApiConfig`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiLayer {
    pub root: Option<String>,
    pub base: Option<String>,
    pub acl_folder: Option<String>,
    pub acls: BTreeMap<String, AclDefinition>,
    pub routes: Vec<RouteEntry>,
    pub case_sensitive_methods: Option<bool>,
    pub acl_path_prefix: Option<bool>,
    pub builtin_modules: Option<bool>,
}

/// How an ACL is declared
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AclDefinition {
    /// `true`: module lives at `root + acl_folder + "/" + name`
    Implicit(bool),
    /// Module lives at `root + path`
    Explicit(String),
    /// Ordered list of single ACL names and/or explicit paths
    Chain(Vec<String>),
}

impl AclDefinition {
    pub fn is_chain(&self) -> bool {
        matches!(self, AclDefinition::Chain(_))
    }
}

/// A route as written in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RouteEntry {
    /// `"METHOD PATH"` or `"ACL METHOD PATH"`
    Line(String),
    /// `{ method, acl?, path }`
    Table {
        method: String,
        #[serde(default)]
        acl: Option<String>,
        path: String,
    },
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteEntry::Line(line) => f.write_str(line.trim()),
            RouteEntry::Table {
                method,
                acl: Some(acl),
                path,
            } => write!(f, "{} {} {}", acl, method, path),
            RouteEntry::Table {
                method,
                acl: None,
                path,
            } => write!(f, "{} {}", method, path),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
