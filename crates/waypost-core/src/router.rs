//! Route table and matcher
//!
//! Routes are registered with a method, a path pattern and a handler:
//!
//! ```rust,ignore
//! use waypost_core::{Route, Router};
//!
//! let mut router = Router::new();
//! router.register(Route::get("/users/{id:int}", show_user).name("user.show"))?;
//! router.register(Route::get("/users/active", active_users))?;
//! router.register(Route::post("/posts/{slug}", create_post).constraint("slug", "slug"))?;
//! ```
//!
//! # Path Patterns
//!
//! - `/users` - Static path
//! - `/users/{id}` - Untyped placeholder, one path segment
//! - `/users/{id:int}` - Typed placeholder (`int`, `slug`, `uuid`, `any`)
//!
//! # Precedence
//!
//! For a given method, a route without placeholders that equals the path
//! exactly always wins. Otherwise routes with fewer placeholders are tried
//! first, and routes with the same number of placeholders are tried in
//! registration order. The first pattern that matches wins.
//!
//! # Route Conflict Detection
//!
//! Two routes for the same method whose patterns only differ in placeholder
//! names or types (e.g. `/users/{id:int}` and `/users/{name}`) are rejected
//! at registration time.

use crate::error::RouteError;
use crate::handler::{into_boxed_handler, Handler};
use crate::middleware::BoxedNext;
use crate::path_params::PathParams;
use crate::pattern::CompiledPattern;
use http::Method;
use std::collections::HashMap;
use std::fmt;

/// Methods a route can be registered for, in the order they are reported in
/// `Allow` headers.
pub const SUPPORTED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// A route waiting to be registered
pub struct Route {
    method: Method,
    pattern: String,
    constraints: Vec<(String, String)>,
    name: Option<String>,
    handler: BoxedNext,
}

macro_rules! method_constructor {
    ($fn:ident, $method:expr) => {
        #[doc = concat!("Create a route for `", stringify!($fn), "` requests")]
        pub fn $fn<H, T>(pattern: impl Into<String>, handler: H) -> Self
        where
            H: Handler<T>,
            T: 'static,
        {
            Self::new($method, pattern, handler)
        }
    };
}

impl Route {
    /// Create a route for any method. Unsupported methods are rejected when
    /// the route is registered.
    pub fn new<H, T>(method: Method, pattern: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self {
            method,
            pattern: pattern.into(),
            constraints: Vec::new(),
            name: None,
            handler: into_boxed_handler(handler),
        }
    }

    method_constructor!(get, Method::GET);
    method_constructor!(post, Method::POST);
    method_constructor!(put, Method::PUT);
    method_constructor!(delete, Method::DELETE);
    method_constructor!(patch, Method::PATCH);
    method_constructor!(options, Method::OPTIONS);

    /// Constrain placeholder `param` to the type `tag` (`int`, `slug`, `uuid`
    /// or `any`). Equivalent to writing `{param:tag}` in the pattern.
    pub fn constraint(mut self, param: impl Into<String>, tag: impl Into<String>) -> Self {
        self.constraints.push((param.into(), tag.into()));
        self
    }

    /// Name the route for reverse routing with `url_for`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The route's method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The route's pattern as written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("constraints", &self.constraints)
            .field("name", &self.name)
            .finish()
    }
}

/// A route stored in the table
pub struct RegisteredRoute {
    id: usize,
    method: Method,
    pattern: CompiledPattern,
    name: Option<String>,
    pub(crate) handler: BoxedNext,
}

impl RegisteredRoute {
    /// Position of the route in registration order
    pub fn id(&self) -> usize {
        self.id
    }

    /// The route's method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The pattern as registered
    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }

    /// The route name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Placeholder names in declared order
    pub fn param_names(&self) -> &[String] {
        self.pattern.param_names()
    }
}

impl fmt::Debug for RegisteredRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredRoute")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .finish()
    }
}

/// Result of route matching
pub enum RouteMatch<'a> {
    /// A route matched; `params` holds the captured placeholders
    Found {
        route: &'a RegisteredRoute,
        params: PathParams,
    },
    /// No route matches the path under any method
    NotFound,
    /// The path matches, but only under other methods
    MethodNotAllowed { allowed: Vec<Method> },
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMatch::Found { route, params } => f
                .debug_struct("Found")
                .field("route", &route.pattern())
                .field("params", params)
                .finish(),
            RouteMatch::NotFound => f.write_str("NotFound"),
            RouteMatch::MethodNotAllowed { allowed } => f
                .debug_struct("MethodNotAllowed")
                .field("allowed", allowed)
                .finish(),
        }
    }
}

/// Routes for a single method
#[derive(Default)]
struct MethodTable {
    /// Placeholder-free patterns, looked up by exact path
    literals: HashMap<String, usize>,
    /// Route ids ordered by (placeholder count, registration order)
    dynamic: Vec<usize>,
    /// Erased pattern shape -> route id, for conflict detection
    shapes: HashMap<String, usize>,
}

/// The route table.
///
/// Built once at startup; matching only needs `&self` and takes no locks.
#[derive(Default)]
pub struct Router {
    routes: Vec<RegisteredRoute>,
    tables: HashMap<Method, MethodTable>,
    names: HashMap<String, usize>,
}

impl Router {
    /// Create an empty route table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are registered
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = &RegisteredRoute> {
        self.routes.iter()
    }

    /// Look up a route by id
    pub fn route(&self, id: usize) -> Option<&RegisteredRoute> {
        self.routes.get(id)
    }

    /// Add a route to the table.
    ///
    /// Nothing is stored when an error is returned.
    pub fn register(&mut self, route: Route) -> Result<&RegisteredRoute, RouteError> {
        let Route {
            method,
            pattern,
            constraints,
            name,
            handler,
        } = route;

        if !SUPPORTED_METHODS.contains(&method) {
            return Err(RouteError::UnsupportedMethod { method, pattern });
        }

        let compiled = CompiledPattern::compile(&pattern, &constraints)?;

        if let Some(table) = self.tables.get(&method) {
            if let Some(&existing) = table.shapes.get(compiled.shape()) {
                return Err(RouteError::DuplicateRoute {
                    method,
                    pattern,
                    existing: self.routes[existing].pattern().to_string(),
                });
            }
        }

        if let Some(name) = &name {
            if self.names.contains_key(name) {
                return Err(RouteError::DuplicateName {
                    name: name.clone(),
                    pattern,
                });
            }
        }

        let id = self.routes.len();
        let count = compiled.placeholder_count();
        let table = self.tables.entry(method.clone()).or_default();
        table.shapes.insert(compiled.shape().to_string(), id);
        if compiled.is_literal() {
            table.literals.insert(compiled.source().to_string(), id);
        } else {
            let routes = &self.routes;
            let at = table
                .dynamic
                .partition_point(|&other| routes[other].pattern.placeholder_count() <= count);
            table.dynamic.insert(at, id);
        }
        if let Some(name) = &name {
            self.names.insert(name.clone(), id);
        }

        tracing::debug!(
            method = %method,
            pattern = %compiled.source(),
            name = name.as_deref().unwrap_or("-"),
            placeholders = count,
            "Registered route"
        );

        self.routes.push(RegisteredRoute {
            id,
            method,
            pattern: compiled,
            name,
            handler,
        });
        Ok(&self.routes[id])
    }

    /// Resolve a request to a route.
    ///
    /// Never fails: a path no route accepts is [`RouteMatch::NotFound`], and a
    /// path only accepted under other methods is
    /// [`RouteMatch::MethodNotAllowed`] listing those methods.
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        if let Some((id, params)) = self
            .tables
            .get(method)
            .and_then(|table| self.find(table, path))
        {
            let route = &self.routes[id];
            tracing::trace!(method = %method, path, route = %route.pattern(), "Route matched");
            return RouteMatch::Found { route, params };
        }

        let allowed: Vec<Method> = SUPPORTED_METHODS
            .iter()
            .filter(|m| *m != method)
            .filter(|m| {
                self.tables
                    .get(*m)
                    .is_some_and(|table| self.accepts(table, path))
            })
            .cloned()
            .collect();

        if allowed.is_empty() {
            tracing::trace!(method = %method, path, "No route matched");
            RouteMatch::NotFound
        } else {
            tracing::trace!(method = %method, path, ?allowed, "Method not allowed");
            RouteMatch::MethodNotAllowed { allowed }
        }
    }

    fn find(&self, table: &MethodTable, path: &str) -> Option<(usize, PathParams)> {
        if let Some(&id) = table.literals.get(path) {
            return Some((id, PathParams::new()));
        }
        table.dynamic.iter().find_map(|&id| {
            self.routes[id]
                .pattern
                .captures(path)
                .map(|params| (id, params))
        })
    }

    fn accepts(&self, table: &MethodTable, path: &str) -> bool {
        table.literals.contains_key(path)
            || table
                .dynamic
                .iter()
                .any(|&id| self.routes[id].pattern.is_match(path))
    }

    /// Build the path of the route called `name`.
    ///
    /// Every placeholder needs a value in `params` that satisfies its type;
    /// extra entries are ignored.
    pub fn url_for<K, V>(&self, name: &str, params: &[(K, V)]) -> Result<String, RouteError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let id = self
            .names
            .get(name)
            .copied()
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;
        self.routes[id].pattern.build_path(name, params)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes).finish()
    }
}
