//! Route table and path-prefix resolution.
//!
//! # Responsibilities
//! - Hold the declarative path → method → route mapping
//! - Resolve the effective route through the configured path prefixes
//! - Report unsupported paths and methods as distinct validation errors
//!
//! # Design Decisions
//! - The table is built once at startup and immutable afterwards
//!   (thread-safe without locks)
//! - Registered paths are canonicalized by stripping trailing slashes
//! - Candidate prefixes are deduplicated and sorted; exactly one prefix is
//!   expected to match a given deployment, so the order carries no meaning

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use serde_json::Value;

use crate::dispatch::error::{DispatchError, HandlerError};

/// Validated parameters handed to a route handler, keyed by declared name.
pub type HandlerParams = BTreeMap<String, Value>;

/// A route handler. Receives only parameters declared on its route and
/// expresses business outcomes (including "not found" and "failed") as
/// return values; an `Err` is contained at the dispatch boundary.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, params: HandlerParams) -> Result<Value, HandlerError>;
}

/// Origin of an input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// URL query string.
    Query,
    /// Parsed JSON request body.
    Body,
}

/// A (path, method) target: handler reference plus its parameter contract.
/// Immutable after construction.
#[derive(Clone)]
pub struct Route {
    handler: Arc<dyn Handler>,
    required: BTreeSet<String>,
    optional: BTreeSet<String>,
    allowed_sources: Vec<ParamSource>,
}

impl Route {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            required: BTreeSet::new(),
            optional: BTreeSet::new(),
            allowed_sources: vec![ParamSource::Query, ParamSource::Body],
        }
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn optional<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional.extend(names.into_iter().map(Into::into));
        self
    }

    /// Restrict the parameter sources this route accepts. Both sources are
    /// allowed unless narrowed here.
    pub fn sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = ParamSource>,
    {
        self.allowed_sources = sources.into_iter().collect();
        self
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn required_names(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn allows(&self, source: ParamSource) -> bool {
        self.allowed_sources.contains(&source)
    }

    /// Whether `name` belongs to the route's allow-list (required ∪ optional).
    pub fn declares(&self, name: &str) -> bool {
        self.required.contains(name) || self.optional.contains(name)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("allowed_sources", &self.allowed_sources)
            .finish_non_exhaustive()
    }
}

/// Static mapping from normalized path → HTTP method → route.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, HashMap<Method, Route>>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder {
            table: RouteTable::default(),
        }
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Look up the route for an already-resolved path. The method string
    /// comes from the normalized request; anything that is not a registered
    /// method for the path is an unsupported-method error.
    pub fn lookup(&self, path: &str, method: &str) -> Result<&Route, DispatchError> {
        let by_method = self.routes.get(path).ok_or_else(|| {
            DispatchError::Validation(format!("Request path `{path}` is not supported."))
        })?;

        Method::from_bytes(method.as_bytes())
            .ok()
            .and_then(|m| by_method.get(&m))
            .ok_or_else(|| {
                DispatchError::Validation(format!(
                    "Request method {method} is not supported for path {path}"
                ))
            })
    }

    /// Try the configured path prefixes to locate a registered route.
    ///
    /// The candidate set is `{""} ∪ prefixes`, deduplicated and sorted. The
    /// first candidate that is a prefix of `full_path` and whose stripped
    /// remainder is a registered path wins.
    pub fn resolve_path(
        &self,
        full_path: &str,
        prefixes: &[String],
    ) -> Result<String, DispatchError> {
        let candidates: BTreeSet<&str> = std::iter::once("")
            .chain(prefixes.iter().map(String::as_str))
            .collect();

        for prefix in &candidates {
            if let Some(rest) = full_path.strip_prefix(prefix) {
                let stripped = rest.trim_end_matches('/');
                if self.contains_path(stripped) {
                    return Ok(stripped.to_string());
                }
            }
        }

        Err(DispatchError::Validation(format!(
            "Request path `{full_path}` is not supported. Tried path prefixes {candidates:?}"
        )))
    }
}

pub struct RouteTableBuilder {
    table: RouteTable,
}

impl RouteTableBuilder {
    /// Register a route. The path is canonicalized by stripping trailing
    /// slashes so `/questions/` and `/questions` are the same entry.
    pub fn route(mut self, path: &str, method: Method, route: Route) -> Self {
        let canonical = path.trim_end_matches('/').to_string();
        self.table
            .routes
            .entry(canonical)
            .or_default()
            .insert(method, route);
        self
    }

    pub fn build(self) -> RouteTable {
        self.table
    }
}
