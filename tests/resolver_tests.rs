//! ACL and route resolver tests against a shared registry

use std::sync::Arc;
use switchyard::access_control::{AclKind, AclResolver, NO_ACL};
use switchyard::config::{AclDefinition, ApiConfig};
use switchyard::error::AclError;
use switchyard::modules::{HandlerMap, MethodMatch, ModuleExport, ModuleLoader, ModuleRegistry};
use switchyard::pipeline::{HandlerResult, Passthrough, Request};
use switchyard::routes::RouteResolver;
use switchyard::SharedContext;

async fn noop(_request: Request) -> HandlerResult {
    Ok(axum::response::IntoResponse::into_response(()))
}

fn allow(_ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
    Ok(ModuleExport::middleware(Passthrough))
}

fn users(_ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
    Ok(HandlerMap::new()
        .on("get", noop)?
        .on("GET /42/profile", noop)?
        .on("DELETE:/42", noop)?
        .into())
}

fn app_root(_ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
    Ok(HandlerMap::new().on("GET /outside", noop)?.into())
}

fn bad_labels(_ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
    Ok(HandlerMap::new().on("GET 42", noop)?.into())
}

fn loader() -> ModuleLoader {
    let mut registry = ModuleRegistry::new();
    registry.register("/app/api/users", users).unwrap();
    registry.register("/app", app_root).unwrap();
    registry.register("/app/api/bad", bad_labels).unwrap();
    registry.register("/app/ACLs/admin", allow).unwrap();
    registry.register("/app/lib/audit", allow).unwrap();
    ModuleLoader::new(Arc::new(registry), SharedContext::default())
}

fn app_api() -> ApiConfig {
    ApiConfig {
        root: "/app".into(),
        ..Default::default()
    }
}

// ============================================================================
// Route resolver
// ============================================================================

#[test]
fn test_longest_prefix_with_sub_path() {
    let loader = loader();
    let api = app_api();
    let resolver = RouteResolver::new(&loader, api.route_root(), MethodMatch::default());

    let found = resolver.resolve("GET", "/users/42/profile").unwrap();
    assert_eq!(found.file_path, "/app/api/users");
    assert_eq!(found.sub_path, "/42/profile");
    assert_eq!(found.label, "GET /42/profile");

    let found = resolver.resolve("delete", "/users/42").unwrap();
    assert_eq!(found.sub_path, "/42");
    assert_eq!(found.label, "DELETE:/42");
}

#[test]
fn test_case_sensitive_methods() {
    let loader = loader();
    let api = app_api();
    let resolver = RouteResolver::new(&loader, api.route_root(), MethodMatch::CaseSensitive);

    assert!(resolver.resolve("GET", "/users").is_none());
    assert!(resolver.resolve("get", "/users").is_some());
}

#[test]
fn test_search_never_leaves_route_root() {
    let loader = loader();
    let api = app_api();
    let resolver = RouteResolver::new(&loader, api.route_root(), MethodMatch::default());

    // `/app` sits above the route root and is never probed
    assert!(resolver.resolve("GET", "/outside").is_none());
    assert!(resolver.resolve("GET", "/users/7/unknown").is_none());
}

#[test]
fn test_broken_route_module_is_skipped() {
    let loader = loader();
    let api = app_api();
    let resolver = RouteResolver::new(&loader, api.route_root(), MethodMatch::default());

    assert!(resolver.resolve("GET", "/bad").is_none());
    assert!(loader.load_strict("/app/api/bad").is_err());
}

// ============================================================================
// ACL resolver
// ============================================================================

#[test]
fn test_resolves_singles_chains_and_passthrough() {
    let loader = loader();
    let mut api = app_api();
    api.acls.insert("admin".into(), AclDefinition::Implicit(true));
    api.acls
        .insert("audit".into(), AclDefinition::Explicit("/lib/audit".into()));
    api.acls.insert(
        "staff".into(),
        AclDefinition::Chain(vec!["admin".into(), "/lib/audit".into(), "audit".into()]),
    );

    let table = AclResolver::new(&api, &loader).resolve().unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.get("admin").unwrap().kind, AclKind::Single);
    assert_eq!(table.get("audit").unwrap().kind, AclKind::Single);
    assert_eq!(table.get(NO_ACL).unwrap().kind, AclKind::Passthrough);

    let staff = table.get("staff").unwrap();
    assert_eq!(staff.kind, AclKind::Chain);
    assert_eq!(staff.pipeline.len(), 3);
    assert!(table.iter().all(|entry| !entry.pipeline.is_empty()));
}

#[test]
fn test_explicit_path_is_rooted() {
    let loader = loader();
    let mut api = app_api();
    // The root is prepended to explicit paths
    api.acls.insert(
        "audit".into(),
        AclDefinition::Explicit("/app/lib/audit".into()),
    );

    let err = AclResolver::new(&api, &loader).resolve().unwrap_err();
    assert!(matches!(
        err,
        AclError::NotFound { ref path, .. } if path == "/app/app/lib/audit"
    ));
    assert!(err.to_string().contains("audit"));
}

#[test]
fn test_chain_entry_must_be_middleware() {
    let loader = loader();
    let mut api = app_api();
    api.acls.insert(
        "staff".into(),
        AclDefinition::Chain(vec!["/api/users".into()]),
    );

    let err = AclResolver::new(&api, &loader).resolve().unwrap_err();
    assert!(matches!(
        err,
        AclError::ChainEntryNotMiddleware { ref entry, .. } if entry == "/api/users"
    ));
}
