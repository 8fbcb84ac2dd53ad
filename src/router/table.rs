use std::sync::Arc;

use super::route::Route;
use super::template::Segment;
use crate::error::{Result, WebError};
use crate::http::{Method, PathParams};

/// Result of a route-table lookup.
#[derive(Debug)]
pub enum RouteLookup {
    /// A route matched; path parameters are bound.
    Found {
        route: Arc<Route>,
        params: PathParams,
    },
    /// The path exists under other methods; carries the allowed set for
    /// the `Allow` header.
    MethodNotAllowed { allowed: Vec<Method> },
    /// No template matches the path.
    NotFound,
}

/// The route table: compiled templates, matched exactly by segment,
/// with literal segments preferred over parameters at the same
/// position.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Insert a route; the same (method, template) twice is a
    /// registration error.
    pub fn insert(&mut self, route: Route) -> Result<()> {
        let duplicate = self.routes.iter().any(|existing| {
            existing.method() == route.method()
                && existing.template().segments_equal(route.template())
        });
        if duplicate {
            return Err(WebError::Registration(format!(
                "duplicate route: {} {}",
                route.method(),
                route.template().raw()
            )));
        }
        self.routes.push(Arc::new(route));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Look up (method, path). Candidates matching the path are ranked
    /// by segment-wise specificity so a literal beats a parameter at
    /// the first position they differ.
    pub fn lookup(&self, method: Method, path: &str) -> RouteLookup {
        let mut best: Option<(&Arc<Route>, PathParams)> = None;
        let mut path_methods: Vec<Method> = Vec::new();

        for route in &self.routes {
            let params = match route.template().matches(path) {
                Some(params) => params,
                None => continue,
            };
            if !path_methods.contains(&route.method()) {
                path_methods.push(route.method());
            }
            if route.method() != method {
                continue;
            }
            best = match best {
                Some((current, current_params))
                    if !more_specific(route.template().segments(), current.template().segments()) =>
                {
                    Some((current, current_params))
                }
                _ => Some((route, params)),
            };
        }

        if let Some((route, params)) = best {
            return RouteLookup::Found {
                route: route.clone(),
                params,
            };
        }

        if !path_methods.is_empty() {
            return RouteLookup::MethodNotAllowed {
                allowed: allow_set(&path_methods),
            };
        }

        RouteLookup::NotFound
    }

    /// Methods registered for a path; feeds CORS method auto-detection
    /// and the default `OPTIONS` response.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.template().matches(path).is_some() && !methods.contains(&route.method()) {
                methods.push(route.method());
            }
        }
        if methods.is_empty() {
            return Vec::new();
        }
        allow_set(&methods)
    }
}

/// The `Allow` set: registered methods plus `OPTIONS`, alphabetical.
fn allow_set(methods: &[Method]) -> Vec<Method> {
    let mut set: Vec<Method> = methods.to_vec();
    if !set.contains(&Method::Options) {
        set.push(Method::Options);
    }
    set.sort_by_key(|method| method.as_str());
    set
}

/// Segment-wise specificity: at the first differing position a literal
/// outranks a parameter.
fn more_specific(candidate: &[Segment], current: &[Segment]) -> bool {
    for (a, b) in candidate.iter().zip(current.iter()) {
        match (a, b) {
            (Segment::Literal(_), Segment::Param(_)) => return true,
            (Segment::Param(_), Segment::Literal(_)) => return false,
            _ => continue,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, HandlerReturn};
    use crate::router::template::PathTemplate;

    fn route(method: Method, template: &str) -> Route {
        Route::new(
            method,
            PathTemplate::compile(template).unwrap(),
            Handler::from_fn("handler", &[], |_| Ok(HandlerReturn::NoContent)),
        )
    }

    fn table(routes: Vec<Route>) -> RouteTable {
        let mut table = RouteTable::new();
        for entry in routes {
            table.insert(entry).unwrap();
        }
        table
    }

    #[test]
    fn test_found_with_params() {
        let table = table(vec![route(Method::Get, "/users/{id}")]);
        match table.lookup(Method::Get, "/users/42") {
            RouteLookup::Found { params, .. } => {
                assert_eq!(params.get("id"), Some("42"));
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_method_not_allowed_with_allow_set() {
        let table = table(vec![route(Method::Get, "/users")]);
        match table.lookup(Method::Post, "/users") {
            RouteLookup::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::Get, Method::Options]);
            }
            other => panic!("expected MethodNotAllowed, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found() {
        let table = table(vec![route(Method::Get, "/users")]);
        assert!(matches!(
            table.lookup(Method::Get, "/unknown"),
            RouteLookup::NotFound
        ));
    }

    #[test]
    fn test_literal_preferred_over_param() {
        let table = table(vec![
            route(Method::Get, "/users/{id}"),
            route(Method::Get, "/users/me"),
        ]);
        match table.lookup(Method::Get, "/users/me") {
            RouteLookup::Found { route, params } => {
                assert_eq!(route.template().raw(), "/users/me");
                assert!(params.is_empty());
            }
            other => panic!("expected Found, got {:?}", other),
        }

        match table.lookup(Method::Get, "/users/42") {
            RouteLookup::Found { route, .. } => {
                assert_eq!(route.template().raw(), "/users/{id}");
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut table = RouteTable::new();
        table.insert(route(Method::Get, "/users/{id}")).unwrap();
        // Same structure under a different parameter name is still the
        // same compiled template shape at the same method.
        assert!(table.insert(route(Method::Get, "/users/{id}")).is_err());
        // Different method is fine.
        table.insert(route(Method::Put, "/users/{id}")).unwrap();
    }

    #[test]
    fn test_allowed_methods_for_path() {
        let table = table(vec![
            route(Method::Get, "/docs/{id}"),
            route(Method::Put, "/docs/{id}"),
            route(Method::Delete, "/docs/{id}"),
        ]);
        assert_eq!(
            table.allowed_methods("/docs/9"),
            vec![Method::Delete, Method::Get, Method::Options, Method::Put]
        );
        assert!(table.allowed_methods("/nope").is_empty());
    }

    #[test]
    fn test_trailing_slash_distinct() {
        let table = table(vec![route(Method::Get, "/users")]);
        assert!(matches!(
            table.lookup(Method::Get, "/users/"),
            RouteLookup::NotFound
        ));
    }
}
