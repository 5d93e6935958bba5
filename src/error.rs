//! Error types for switchyard
//!
//! This module defines the error hierarchy used throughout the crate.
//! Every error here is a boot-time error: it aborts mounting before a router
//! exists. Request-time failures are `anyhow::Error` values turned into
//! responses by the error-interception layer.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid route '{entry}': {reason}")]
    InvalidRoute { entry: String, reason: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }

    pub fn route(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidRoute {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

/// Module registration errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Module path '{path}' is registered twice")]
    Duplicate { path: String },

    #[error("Invalid module path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Errors raised while a factory assembles its export
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Invalid handler label '{label}': expected \"METHOD\" or \"METHOD /sub/path\"")]
    InvalidLabel { label: String },

    #[error("Handler label '{label}' is declared twice")]
    DuplicateLabel { label: String },

    #[error("Missing context setting '{key}'")]
    MissingSetting { key: String },

    #[error("Invalid context setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

/// Module lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Module not found: {path}")]
    NotFound { path: String },

    #[error("Module {path} failed to initialize: {reason}")]
    Factory { path: String, reason: String },
}

/// ACL resolution errors
#[derive(Error, Debug)]
pub enum AclError {
    #[error("Middleware {acl} not found in {path}")]
    NotFound { acl: String, path: String },

    #[error("Middleware {acl} wrong format: {reason}")]
    WrongFormat { acl: String, reason: String },

    #[error("Middleware {acl} does not export a middleware (found {found} in {path})")]
    NotMiddleware {
        acl: String,
        path: String,
        found: &'static str,
    },

    #[error("Middleware {entry} of chain {acl} not found in {path}")]
    ChainEntryNotFound {
        acl: String,
        entry: String,
        path: String,
    },

    #[error("Middleware {entry} of chain {acl} wrong format: {reason}")]
    ChainEntryWrongFormat {
        acl: String,
        entry: String,
        reason: String,
    },

    #[error("Middleware {entry} of chain {acl} does not export a middleware (found {found})")]
    ChainEntryNotMiddleware {
        acl: String,
        entry: String,
        found: &'static str,
    },

    #[error("Invalid definition for ACL {acl}: {reason}")]
    InvalidDefinition { acl: String, reason: String },
}

/// Errors raised while composing the router tree
#[derive(Error, Debug)]
pub enum MountError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Acl(#[from] AclError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Route '{route}' uses undeclared ACL '{acl}'")]
    UnknownAcl { acl: String, route: String },

    #[error("Route '{route}' uses unsupported HTTP method '{method}'")]
    UnsupportedMethod { method: String, route: String },

    #[error("{method} {path} is mounted twice")]
    DuplicateRoute { method: String, path: String },

    #[error("Path {path} is claimed by ACL '{acl}' and ACL '{other}'")]
    PathConflict {
        path: String,
        acl: String,
        other: String,
    },

    #[error("Path {path} overlaps {other} with different parameter names")]
    AmbiguousRoute { path: String, other: String },
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

/// Result type alias for mount operations
pub type MountResult<T> = std::result::Result<T, MountError>;
