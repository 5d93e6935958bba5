//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Explicit profile argument, then `APP_ENV` (profile only)
//! 2. Environment variables (SWITCHYARD__*)
//! 3. Configuration file (TOML)
//! 4. Default values
//!
//! After deserialization the active profile's `[profiles.<name>]` layer is
//! merged into `[api]` and the result is validated. Any failure aborts loading.

use crate::access_control::NO_ACL;
use crate::config::types::{AclDefinition, ApiConfig, AppConfig};
use crate::error::ConfigError;
use crate::routes::RouteSpec;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashSet;
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "switchyard.toml",
    ".switchyard.toml",
    "~/.config/switchyard/config.toml",
    "/etc/switchyard/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
///
/// Environment variables are not consulted.
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    finish(config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    load_config_with_profile(config_path, None)
}

/// Load configuration, forcing the active profile when `profile` is given
pub fn load_config_with_profile(
    config_path: Option<&str>,
    profile: Option<&str>,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with SWITCHYARD__ prefix
    // e.g., SWITCHYARD__PROFILE, SWITCHYARD__SERVER__PORT, SWITCHYARD__API__BASE
    builder = builder.add_source(
        Environment::with_prefix("SWITCHYARD")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    // 4. APP_ENV is the conventional profile selector
    if let Ok(profile) = std::env::var("APP_ENV")
        && !profile.is_empty()
    {
        builder = builder
            .set_override("profile", profile)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }
    if let Some(profile) = profile {
        builder = builder
            .set_override("profile", profile)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    finish(config)
}

fn finish(config: Config) -> Result<AppConfig, ConfigError> {
    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    app_config.apply_profile();
    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.profile.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "profile".to_string(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::invalid("server.port must be greater than 0"));
    }

    validate_api(&config.api)
}

/// Validate the mounting section: prefixes, ACL definitions and routes
pub fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    validate_prefix(&api.root, "api.root")?;
    validate_prefix(&api.base, "api.base")?;
    validate_prefix(&api.acl_folder, "api.acl_folder")?;

    for (name, definition) in &api.acls {
        validate_acl(name, definition)?;
    }

    let mut seen = HashSet::new();
    for entry in &api.routes {
        let spec = RouteSpec::parse(entry)?;
        if spec.has_acl() && !api.acls.contains_key(&spec.acl) {
            return Err(ConfigError::route(
                entry.to_string(),
                format!("ACL '{}' is not declared in api.acls", spec.acl),
            ));
        }
        let key = (spec.acl.clone(), spec.method.to_ascii_uppercase(), spec.path.clone());
        if !seen.insert(key) {
            return Err(ConfigError::route(entry.to_string(), "route is declared twice"));
        }
    }

    Ok(())
}

/// A prefix is either empty or starts with '/' and does not end with '/'
fn validate_prefix(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Ok(());
    }

    if !value.starts_with('/') {
        return Err(ConfigError::invalid(format!(
            "{} must be empty or start with '/', got: {}",
            field, value
        )));
    }

    if value.ends_with('/') {
        return Err(ConfigError::invalid(format!(
            "{} must not end with '/', got: {}",
            field, value
        )));
    }

    if value.contains("//") {
        return Err(ConfigError::invalid(format!(
            "{} must not contain empty segments, got: {}",
            field, value
        )));
    }

    Ok(())
}

fn validate_acl(name: &str, definition: &AclDefinition) -> Result<(), ConfigError> {
    if name == NO_ACL {
        return Err(ConfigError::invalid(format!(
            "api.acls.{} is reserved for routes without an ACL",
            name
        )));
    }

    if name.is_empty() || name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(format!(
            "ACL name '{}' must be a single URL path segment",
            name
        )));
    }

    match definition {
        AclDefinition::Implicit(true) => Ok(()),
        AclDefinition::Implicit(false) => Err(ConfigError::invalid(format!(
            "api.acls.{} must be true, a module path or a list",
            name
        ))),
        AclDefinition::Explicit(path) if !path.starts_with('/') => {
            Err(ConfigError::invalid(format!(
                "api.acls.{} path must start with '/', got: {}",
                name, path
            )))
        }
        AclDefinition::Explicit(_) => Ok(()),
        AclDefinition::Chain(entries) if entries.is_empty() => Err(ConfigError::invalid(
            format!("api.acls.{} chain must not be empty", name),
        )),
        AclDefinition::Chain(entries) => {
            if let Some(entry) = entries.iter().find(|e| e.trim().is_empty()) {
                return Err(ConfigError::invalid(format!(
                    "api.acls.{} chain contains an empty entry '{}'",
                    name, entry
                )));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteEntry;

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
profile = "test"

[api]
base = "/v1"
routes = ["GET /health"]
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.profile, "test");
        assert_eq!(config.api.base, "/v1");
        assert_eq!(config.api.routes, vec![RouteEntry::Line("GET /health".into())]);
    }

    #[test]
    fn test_load_config_from_str_with_acls() {
        let toml = r#"
[api]
routes = ["admin GET /roles/7", "staff POST /roles"]

[api.acls]
admin = true
audit = "/ACLs/audit"
staff = ["admin", "/ACLs/audit"]
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.api.acls.len(), 3);
        assert_eq!(
            config.api.acls.get("admin"),
            Some(&AclDefinition::Implicit(true))
        );
        assert!(config.api.acls.get("staff").unwrap().is_chain());
    }

    #[test]
    fn test_invalid_base_error() {
        let toml = r#"
[api]
base = "api"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let toml = r#"
[api]
base = "/api/"
"#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_undeclared_acl_error() {
        let toml = r#"
[api]
routes = ["admin GET /roles"]
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::InvalidRoute { .. })));
    }

    #[test]
    fn test_false_acl_error() {
        let toml = r#"
[api.acls]
admin = false
"#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_empty_chain_error() {
        let toml = r#"
[api.acls]
staff = []
"#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_reserved_acl_name_error() {
        let mut config = AppConfig::default();
        config
            .api
            .acls
            .insert(NO_ACL.to_string(), AclDefinition::Implicit(true));

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_duplicate_route_error() {
        let toml = r#"
[api]
routes = ["GET /health", "get /health"]
"#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_zero_port_error() {
        let toml = r#"
[server]
port = 0
"#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_profile_layer_validated_after_merge() {
        let toml = r#"
profile = "production"

[api]
routes = ["GET /health"]

[profiles.production]
routes = ["admin GET /roles"]
"#;
        // The production layer adds a route behind an ACL nobody declared
        assert!(load_config_from_str(toml).is_err());
    }
}
