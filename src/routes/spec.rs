//! Route specifications
//!
//! Parses the configured route entries into [`RouteSpec`] values.

use crate::access_control::NO_ACL;
use crate::config::RouteEntry;
use crate::error::ConfigError;
use std::fmt;

/// One route to mount: an HTTP method, an ACL name and a URL path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    /// HTTP method as written in the configuration
    pub method: String,
    /// ACL name, or [`NO_ACL`] when none was given
    pub acl: String,
    /// URL path template (e.g., `/roles/:id`)
    pub path: String,
}

impl RouteSpec {
    /// Create a route spec, validating its parts
    pub fn new(
        method: impl Into<String>,
        acl: Option<&str>,
        path: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let method = method.into();
        let path = path.into();
        let acl = match acl.map(str::trim) {
            Some("") | None => NO_ACL.to_string(),
            Some(acl) => acl.to_string(),
        };

        let spec = Self { method, acl, path };
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a configured route entry
    pub fn parse(entry: &RouteEntry) -> Result<Self, ConfigError> {
        match entry {
            RouteEntry::Line(line) => Self::parse_line(line),
            RouteEntry::Table { method, acl, path } => {
                Self::new(method.trim(), acl.as_deref(), path.trim())
            }
        }
    }

    /// Parse a `"METHOD PATH"` or `"ACL METHOD PATH"` line
    pub fn parse_line(line: &str) -> Result<Self, ConfigError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [method, path] => Self::new(*method, None, *path),
            [acl, method, path] => Self::new(*method, Some(acl), *path),
            _ => Err(ConfigError::route(
                line.trim(),
                "expected \"METHOD PATH\" or \"ACL METHOD PATH\"",
            )),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.method.is_empty() || !self.method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::route(
                self.to_string(),
                format!("invalid method '{}'", self.method),
            ));
        }

        if !self.path.starts_with('/') {
            return Err(ConfigError::route(
                self.to_string(),
                format!("path must start with '/', got: {}", self.path),
            ));
        }

        if self.acl.contains('/') {
            return Err(ConfigError::route(
                self.to_string(),
                format!("ACL name must not contain '/', got: {}", self.acl),
            ));
        }

        Ok(())
    }

    /// Whether this route runs behind a named ACL
    pub fn has_acl(&self) -> bool {
        self.acl != NO_ACL
    }

    /// The path in axum's template syntax
    pub fn axum_path(&self) -> String {
        to_axum_path(&self.path)
    }
}

impl fmt::Display for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_acl() {
            write!(f, "{} {} {}", self.acl, self.method, self.path)
        } else {
            write!(f, "{} {}", self.method, self.path)
        }
    }
}

/// Translate `:param` and `*wildcard` segments into `{param}` / `{*wildcard}`
pub fn to_axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{}}}", name)
            } else if let Some(name) = segment.strip_prefix('*') {
                let name = if name.is_empty() { "rest" } else { name };
                format!("{{*{}}}", name)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_two_tokens_uses_sentinel_acl() {
        let spec = RouteSpec::parse_line("GET /add/one").unwrap();
        assert_eq!(spec.method, "GET");
        assert_eq!(spec.acl, NO_ACL);
        assert_eq!(spec.path, "/add/one");
        assert!(!spec.has_acl());
    }

    #[test]
    fn test_parse_three_tokens() {
        let spec = RouteSpec::parse_line("  admin   get /roles/7 ").unwrap();
        assert_eq!(spec.acl, "admin");
        assert_eq!(spec.method, "get");
        assert_eq!(spec.path, "/roles/7");
        assert_eq!(spec.to_string(), "admin get /roles/7");
    }

    #[rstest]
    #[case("")]
    #[case("GET")]
    #[case("a b c d")]
    #[case("GET roles")]
    #[case("G3T /roles")]
    #[case("a/b GET /roles")]
    fn test_parse_rejects_malformed_lines(#[case] line: &str) {
        assert!(matches!(
            RouteSpec::parse_line(line),
            Err(ConfigError::InvalidRoute { .. })
        ));
    }

    #[test]
    fn test_parse_table_entry_with_empty_acl() {
        let entry = RouteEntry::Table {
            method: "POST".into(),
            acl: Some(String::new()),
            path: "/roles".into(),
        };
        let spec = RouteSpec::parse(&entry).unwrap();
        assert_eq!(spec.acl, NO_ACL);
    }

    #[rstest]
    #[case("/roles/7", "/roles/7")]
    #[case("/roles/:id", "/roles/{id}")]
    #[case("/files/*path", "/files/{*path}")]
    #[case("/files/*", "/files/{*rest}")]
    #[case("/", "/")]
    fn test_axum_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_axum_path(input), expected);
    }
}
