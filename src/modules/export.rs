//! What a module factory hands back

use crate::error::ModuleError;
use crate::pipeline::{BoxedHandler, BoxedMiddleware, Handler, Middleware};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// `METHOD` optionally followed by separators and a sub-path
static LABEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)(?:[\s,:]+(/\S*))?$").expect("label pattern is valid")
});

/// The value a module factory produces
#[derive(Clone)]
pub enum ModuleExport {
    /// A single middleware (ACL or chain entry modules)
    Middleware(BoxedMiddleware),
    /// Labelled handlers (route modules)
    Handlers(HandlerMap),
}

impl ModuleExport {
    /// Wrap a middleware
    pub fn middleware(middleware: impl Middleware + 'static) -> Self {
        ModuleExport::Middleware(Arc::new(middleware))
    }

    /// Short description used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ModuleExport::Middleware(_) => "middleware",
            ModuleExport::Handlers(_) => "handler map",
        }
    }

    pub fn as_middleware(&self) -> Option<&BoxedMiddleware> {
        match self {
            ModuleExport::Middleware(middleware) => Some(middleware),
            ModuleExport::Handlers(_) => None,
        }
    }

    pub fn as_handlers(&self) -> Option<&HandlerMap> {
        match self {
            ModuleExport::Handlers(map) => Some(map),
            ModuleExport::Middleware(_) => None,
        }
    }
}

impl From<HandlerMap> for ModuleExport {
    fn from(map: HandlerMap) -> Self {
        ModuleExport::Handlers(map)
    }
}

impl fmt::Debug for ModuleExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleExport::Middleware(_) => f.write_str("Middleware(..)"),
            ModuleExport::Handlers(map) => f.debug_tuple("Handlers").field(map).finish(),
        }
    }
}

/// How handler label methods are compared to the route method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodMatch {
    CaseSensitive,
    #[default]
    CaseInsensitive,
}

impl MethodMatch {
    pub fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            MethodMatch::CaseSensitive
        } else {
            MethodMatch::CaseInsensitive
        }
    }

    fn matches(self, label_method: &str, method: &str) -> bool {
        match self {
            MethodMatch::CaseSensitive => label_method == method,
            MethodMatch::CaseInsensitive => label_method.eq_ignore_ascii_case(method),
        }
    }
}

struct HandlerEntry {
    label: String,
    method: String,
    sub_path: Option<String>,
    handler: BoxedHandler,
}

/// A handler matched by [`HandlerMap::pick`]
#[derive(Clone)]
pub struct PickedHandler {
    pub label: String,
    pub handler: BoxedHandler,
}

/// Ordered `"METHOD[ sub/path]"` → handler table
///
/// ```ignore
/// let map = HandlerMap::new()
///     .on("GET", list_roles)?
///     .on("GET /42/profile", show_profile)?;
/// ```
#[derive(Clone, Default)]
pub struct HandlerMap {
    entries: Vec<Arc<HandlerEntry>>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler under `label`
    ///
    /// The label is `METHOD`, or `METHOD` and a sub-path starting with `/`
    /// separated by whitespace, `,` or `:`.
    pub fn on(mut self, label: &str, handler: impl Handler + 'static) -> Result<Self, ModuleError> {
        let trimmed = label.trim();
        let captures = LABEL_PATTERN
            .captures(trimmed)
            .ok_or_else(|| ModuleError::InvalidLabel {
                label: label.to_string(),
            })?;

        let method = captures[1].to_string();
        let sub_path = captures.get(2).map(|m| m.as_str().to_string());

        let duplicate = self
            .entries
            .iter()
            .any(|e| e.method == method && e.sub_path == sub_path);
        if duplicate {
            return Err(ModuleError::DuplicateLabel {
                label: trimmed.to_string(),
            });
        }

        self.entries.push(Arc::new(HandlerEntry {
            label: trimmed.to_string(),
            method,
            sub_path,
            handler: Arc::new(handler),
        }));
        Ok(self)
    }

    /// First handler whose label names `method` and exactly `sub_path`
    ///
    /// An empty `sub_path` only matches labels without one.
    pub fn pick(&self, method: &str, sub_path: &str, mode: MethodMatch) -> Option<PickedHandler> {
        self.entries
            .iter()
            .find(|entry| {
                mode.matches(&entry.method, method)
                    && match &entry.sub_path {
                        None => sub_path.is_empty(),
                        Some(path) => path == sub_path,
                    }
            })
            .map(|entry| PickedHandler {
                label: entry.label.clone(),
                handler: Arc::clone(&entry.handler),
            })
    }

    /// Labels in declaration order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HandlerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.labels()).finish()
    }
}
