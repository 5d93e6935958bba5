//! Configuration loading tests

use switchyard::config::{
    AclDefinition, LogFormat, RouteEntry, load_config, load_config_from_str,
    load_config_with_profile,
};
use switchyard::error::ConfigError;

const MINIMAL_CONFIG: &str = r#"
[api]
routes = ["GET /health"]
"#;

const FULL_CONFIG: &str = r#"
profile = "staging"

[server]
host = "0.0.0.0"
port = 9000

[logging]
level = "debug"
format = "json"

[context]
namespace = "billing"

[context.settings]
bearer_tokens = ["secret"]
limit = 10

[api]
root = "/app"
base = "/v1"
acl_folder = "/guards"
case_sensitive_methods = true
acl_path_prefix = false
builtin_modules = false
routes = [
    "GET /health",
    "admin GET /roles/:id",
    { method = "POST", acl = "staff", path = "/roles" },
]

[api.acls]
admin = true
audit = "/lib/audit"
staff = ["admin", "/lib/audit"]
"#;

#[test]
fn test_minimal_config() {
    let config = load_config_from_str(MINIMAL_CONFIG).unwrap();

    assert_eq!(config.profile, "development");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.api.base, "/api");
    assert!(config.api.acls.is_empty());
    assert_eq!(config.api.routes.len(), 1);
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    assert_eq!(config.profile, "staging");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);

    assert_eq!(config.context.namespace, "billing");
    assert_eq!(
        config.context.settings.get("limit"),
        Some(&serde_json::json!(10))
    );

    let api = &config.api;
    assert_eq!(api.route_root(), "/app/v1");
    assert_eq!(api.implicit_acl_path("admin"), "/app/guards/admin");
    assert!(api.case_sensitive_methods);
    assert!(!api.acl_path_prefix);
    assert!(!api.builtin_modules);

    assert_eq!(api.acls.get("admin"), Some(&AclDefinition::Implicit(true)));
    assert_eq!(
        api.acls.get("audit"),
        Some(&AclDefinition::Explicit("/lib/audit".into()))
    );
    assert_eq!(
        api.acls.get("staff"),
        Some(&AclDefinition::Chain(vec![
            "admin".into(),
            "/lib/audit".into()
        ]))
    );

    assert_eq!(api.routes.len(), 3);
    assert_eq!(
        api.routes[2],
        RouteEntry::Table {
            method: "POST".into(),
            acl: Some("staff".into()),
            path: "/roles".into(),
        }
    );
}

#[test]
fn test_profile_layer_merges() {
    let toml = r#"
profile = "production"

[api]
routes = ["admin GET /roles"]

[api.acls]
admin = true

[profiles.production]
base = "/v2"
routes = ["GET /status"]

[profiles.production.acls]
admin = "/strict/admin"
"#;

    let config = load_config_from_str(toml).unwrap();
    assert!(config.is_production());
    assert_eq!(config.api.base, "/v2");
    assert_eq!(
        config.api.acls.get("admin"),
        Some(&AclDefinition::Explicit("/strict/admin".into()))
    );
    let routes: Vec<String> = config.api.routes.iter().map(|r| r.to_string()).collect();
    assert_eq!(routes, vec!["admin GET /roles", "GET /status"]);
}

#[test]
fn test_profile_layer_appends_chains() {
    let toml = r#"
profile = "production"

[api]
routes = ["staff GET /roles"]

[api.acls]
admin = true
staff = ["admin"]
audit = ["admin"]

[profiles.production.acls]
staff = ["/lib/audit"]
audit = "/lib/audit"
"#;

    let config = load_config_from_str(toml).unwrap();
    assert_eq!(
        config.api.acls.get("staff"),
        Some(&AclDefinition::Chain(vec!["admin".into(), "/lib/audit".into()]))
    );
    // A non-chain layer value still replaces the chain
    assert_eq!(
        config.api.acls.get("audit"),
        Some(&AclDefinition::Explicit("/lib/audit".into()))
    );
}

#[test]
fn test_inactive_profile_ignored() {
    let toml = r#"
[api]
routes = ["GET /health"]

[profiles.production]
base = "/v2"
"#;

    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.profile, "development");
    assert_eq!(config.api.base, "/api");
}

#[test]
fn test_invalid_route_line() {
    let toml = r#"
[api]
routes = ["GET"]
"#;
    let result = load_config_from_str(toml);
    assert!(matches!(result, Err(ConfigError::InvalidRoute { .. })));
}

#[test]
fn test_invalid_acl_name() {
    let toml = r#"
[api.acls]
"a/b" = true
"#;
    let result = load_config_from_str(toml);
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_explicit_acl_path_must_be_absolute() {
    let toml = r#"
[api.acls]
audit = "lib/audit"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn test_missing_explicit_file() {
    let result = load_config(Some("/nonexistent/switchyard.toml"));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial_test::serial]
fn test_env_var_overrides_file() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("switchyard.toml");
    fs::write(
        &config_path,
        r#"
[server]
port = 9000

[api]
base = "/v1"
"#,
    )
    .unwrap();

    unsafe {
        env::set_var("SWITCHYARD__SERVER__PORT", "9100");
        env::set_var("SWITCHYARD__API__BASE", "/v9");
        env::remove_var("APP_ENV");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("SWITCHYARD__SERVER__PORT");
        env::remove_var("SWITCHYARD__API__BASE");
    }

    let config = config.unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.api.base, "/v9");
}

#[test]
#[serial_test::serial]
fn test_app_env_selects_profile() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("switchyard.toml");
    fs::write(
        &config_path,
        r#"
[api]
routes = ["GET /health"]

[profiles.production]
routes = ["GET /status"]
"#,
    )
    .unwrap();

    unsafe {
        env::set_var("APP_ENV", "production");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("APP_ENV");
    }

    let config = config.unwrap();
    assert!(config.is_production());
    assert_eq!(config.api.routes.len(), 2);
}

#[test]
#[serial_test::serial]
fn test_explicit_profile_wins_over_app_env() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("switchyard.toml");
    fs::write(&config_path, "profile = \"development\"\n").unwrap();

    unsafe {
        env::set_var("APP_ENV", "production");
    }

    let config = load_config_with_profile(Some(config_path.to_str().unwrap()), Some("staging"));

    unsafe {
        env::remove_var("APP_ENV");
    }

    assert_eq!(config.unwrap().profile, "staging");
}
