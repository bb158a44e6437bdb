//! Route registry.
//!
//! Routes are grouped per method and kept sorted by precedence, so lookup is
//! a linear scan that stops at the first structural match. Build it once at
//! startup; after that it is only ever read.
//!
//! # Precedence
//!
//! Several patterns can match the same concrete path (`/pets/new` and
//! `/pets/:id` both match `/pets/new`). The winner is decided by:
//!
//! 1. more literal segments first;
//! 2. on a tie, the pattern with a literal where the other has a parameter
//!    at the leftmost position where they differ;
//! 3. registration order.
//!
//! Rule 3 only orders patterns that can never match the same path, since
//! patterns of identical shape are rejected as duplicates.

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::method::Method;
use crate::path::{Params, PathPattern};
use crate::route::Route;

/// A successful lookup: the route and the parameters it captured.
#[derive(Debug)]
pub struct Matched {
    pub route: Arc<Route>,
    pub params: Params,
}

/// The application router.
///
/// Each [`Router::route`] call returns `self` so registrations chain:
///
/// ```rust
/// # use schemaroute::{BoxError, Method, RouteSpec, Router, schema::any};
/// # fn main() -> Result<(), schemaroute::Error> {
/// # async fn h(v: serde_json::Value) -> Result<serde_json::Value, BoxError> { Ok(v) }
/// let router = Router::new()
///     .route(RouteSpec::new(Method::Get,  "/pets/:id", any(), any())?.handler(h))?
///     .route(RouteSpec::new(Method::Post, "/pets",     any(), any())?.handler(h))?;
/// assert_eq!(router.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Arc<Route>>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers every route in order, stopping at the first error.
    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Result<Self, Error> {
        routes.into_iter().try_fold(Self::new(), Self::route)
    }

    /// Registers a route. Returns `self` for chaining.
    pub fn route(mut self, route: Route) -> Result<Self, Error> {
        self.register(route)?;
        Ok(self)
    }

    /// Registers a route.
    ///
    /// Fails with [`Error::DuplicateRoute`] if a route with the same method
    /// and an equivalent pattern (same shape, parameter names aside) exists.
    pub fn register(&mut self, route: Route) -> Result<(), Error> {
        let method = route.spec().method();
        let routes = self.routes.entry(method).or_default();

        let pattern = route.spec().path();
        if let Some(existing) = routes.iter().find(|r| r.spec().path().same_shape(pattern)) {
            return Err(Error::DuplicateRoute {
                method,
                pattern: pattern.to_string(),
                existing: existing.spec().path().to_string(),
            });
        }

        debug!(%method, path = %pattern, "route registered");

        // Insert after every route that sorts before or equal, keeping
        // registration order among equals.
        let at = routes.partition_point(|r| precedence(r.spec().path(), pattern) != Ordering::Greater);
        routes.insert(at, Arc::new(route));
        Ok(())
    }

    /// Finds the highest-precedence route for `method` matching `path`.
    pub fn lookup(&self, method: Method, path: &str) -> Option<Matched> {
        self.routes.get(&method)?.iter().find_map(|route| {
            let params = route.spec().path().matches(path)?;
            Some(Matched { route: Arc::clone(route), params })
        })
    }

    /// All routes, grouped by method, each group in precedence order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values().flatten().map(|r| &**r)
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `Less` means `a` is tried before `b`.
fn precedence(a: &PathPattern, b: &PathPattern) -> Ordering {
    let key = |p: &PathPattern| {
        let mask: Vec<bool> = p.segments().iter().map(|s| s.is_param()).collect();
        (Reverse(p.literal_count()), mask)
    };
    key(a).cmp(&key(b))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::error::BoxError;
    use crate::route::RouteSpec;
    use crate::schema::any;

    fn route(method: Method, path: &str) -> Route {
        let tag = path.to_owned();
        RouteSpec::new(method, path, any(), any())
            .unwrap()
            .handler(move || {
                let tag = tag.clone();
                async move { Ok::<_, BoxError>(Value::String(tag)) }
            })
    }

    fn matched_pattern(router: &Router, method: Method, path: &str) -> Option<String> {
        router
            .lookup(method, path)
            .map(|m| m.route.spec().path().to_string())
    }

    #[test]
    fn binds_params() {
        let router = Router::new().route(route(Method::Get, "/pets/:id")).unwrap();
        let m = router.lookup(Method::Get, "/pets/42").unwrap();
        assert_eq!(m.params.get("id"), Some("42"));
        assert_eq!(m.route.spec().method(), Method::Get);
    }

    #[test]
    fn methods_are_separate() {
        let router = Router::from_routes([route(Method::Get, "/pets"), route(Method::Post, "/pets")]).unwrap();
        assert!(router.lookup(Method::Get, "/pets").is_some());
        assert!(router.lookup(Method::Post, "/pets").is_some());
        assert!(router.lookup(Method::Delete, "/pets").is_none());
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn unknown_path_is_none() {
        let router = Router::new().route(route(Method::Get, "/pets")).unwrap();
        assert!(router.lookup(Method::Get, "/nonexistent").is_none());
        assert!(router.lookup(Method::Get, "/pets/").is_none());
    }

    #[test]
    fn rejects_equivalent_patterns() {
        let err = Router::new()
            .route(route(Method::Get, "/pets/:id"))
            .unwrap()
            .route(route(Method::Get, "/pets/:name"))
            .unwrap_err();
        match err {
            Error::DuplicateRoute { method, pattern, existing } => {
                assert_eq!(method, Method::Get);
                assert_eq!(pattern, "/pets/:name");
                assert_eq!(existing, "/pets/:id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_pattern_other_method_is_fine() {
        let router = Router::from_routes([route(Method::Get, "/pets/:id"), route(Method::Delete, "/pets/:id")]);
        assert!(router.is_ok());
    }

    #[test]
    fn literal_beats_param() {
        // Registered param-first on purpose: order of registration must not matter.
        let router = Router::from_routes([route(Method::Get, "/pets/:id"), route(Method::Get, "/pets/new")]).unwrap();
        assert_eq!(matched_pattern(&router, Method::Get, "/pets/new").as_deref(), Some("/pets/new"));
        assert_eq!(matched_pattern(&router, Method::Get, "/pets/7").as_deref(), Some("/pets/:id"));
    }

    #[test]
    fn more_literals_win() {
        let router = Router::from_routes([
            route(Method::Get, "/x/:b/:c"),
            route(Method::Get, "/:a/b/c"),
        ])
        .unwrap();
        assert_eq!(matched_pattern(&router, Method::Get, "/x/b/c").as_deref(), Some("/:a/b/c"));
        assert_eq!(matched_pattern(&router, Method::Get, "/x/y/z").as_deref(), Some("/x/:b/:c"));
    }

    #[test]
    fn leftmost_literal_breaks_ties() {
        let router = Router::from_routes([
            route(Method::Get, "/:a/x"),
            route(Method::Get, "/b/:c"),
        ])
        .unwrap();
        assert_eq!(matched_pattern(&router, Method::Get, "/b/x").as_deref(), Some("/b/:c"));
        assert_eq!(matched_pattern(&router, Method::Get, "/q/x").as_deref(), Some("/:a/x"));
    }

    #[tokio::test]
    async fn handler_is_reachable_through_lookup() {
        let router = Router::new().route(route(Method::Get, "/pets")).unwrap();
        let m = router.lookup(Method::Get, "/pets").unwrap();
        let out = m.route.handler().call(json!({})).await.unwrap();
        assert_eq!(out, json!("/pets"));
    }
}
