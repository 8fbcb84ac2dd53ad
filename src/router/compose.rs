use std::collections::HashMap;
use std::sync::Arc;

use super::route::{PolicyLayer, Route, RouteOverrides};
use super::template::PathTemplate;
use crate::cors::CorsConfig;
use crate::csp::CspConfig;
use crate::error::Result;
use crate::handler::Handler;
use crate::http::Method;
use crate::negotiate::Renderer;
use crate::provider::Provider;

/// A route awaiting compilation: raw template plus everything the
/// builder knew at registration.
pub struct RouteSpec {
    pub method: Method,
    pub path: String,
    pub handler: Handler,
    pub overrides: RouteOverrides,
}

impl RouteSpec {
    pub fn new(method: Method, path: impl Into<String>, handler: Handler) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
            overrides: RouteOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: RouteOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A mountable sub-router: routes under a shared prefix with a shared
/// policy layer. Policies inherit app → router → route; a route-level
/// override replaces the router's record, which replaces the app's.
pub struct Router {
    prefix: String,
    specs: Vec<RouteSpec>,
    children: Vec<Router>,
    cors: Option<CorsConfig>,
    csp: Option<CspConfig>,
    renderers: Vec<Renderer>,
    providers: HashMap<String, Arc<Provider>>,
}

impl Router {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            specs: Vec::new(),
            children: Vec::new(),
            cors: None,
            csp: None,
            renderers: Vec::new(),
            providers: HashMap::new(),
        }
    }

    pub fn route(mut self, method: Method, path: impl Into<String>, handler: Handler) -> Self {
        self.specs.push(RouteSpec::new(method, path, handler));
        self
    }

    pub fn route_with(
        mut self,
        method: Method,
        path: impl Into<String>,
        handler: Handler,
        overrides: RouteOverrides,
    ) -> Self {
        self.specs
            .push(RouteSpec::new(method, path, handler).with_overrides(overrides));
        self
    }

    /// Router-level CORS policy for all contained routes without their
    /// own override.
    pub fn cors(mut self, config: CorsConfig) -> Self {
        self.cors = Some(config);
        self
    }

    pub fn csp(mut self, config: CspConfig) -> Self {
        self.csp = Some(config);
        self
    }

    pub fn renderer(mut self, renderer: Renderer) -> Self {
        self.renderers.push(renderer);
        self
    }

    /// Router-scoped provider visible to all contained routes; shadows
    /// an app-level provider of the same name.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers
            .insert(provider.name().to_string(), Arc::new(provider));
        self
    }

    /// Mount a nested router under this one. The child's prefix
    /// concatenates onto this router's; where the child sets no policy
    /// of its own, this router's applies.
    pub fn mount(mut self, child: Router) -> Self {
        self.children.push(child);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Compile into mounted routes carrying this router's policy layer.
    pub(crate) fn into_routes(self) -> Result<Vec<Route>> {
        self.into_routes_under("", &PolicyLayer::default())
    }

    fn into_routes_under(
        self,
        outer_prefix: &str,
        outer_layer: &PolicyLayer,
    ) -> Result<Vec<Route>> {
        let prefix = format!("{}{}", outer_prefix.trim_end_matches('/'), self.prefix);

        // Inner policy records replace outer ones where set; providers
        // accumulate with the inner level shadowing on name collisions.
        let mut providers = outer_layer.providers.clone();
        providers.extend(self.providers);
        let layer = PolicyLayer {
            cors: self.cors.or_else(|| outer_layer.cors.clone()),
            csp: self.csp.or_else(|| outer_layer.csp.clone()),
            renderers: if self.renderers.is_empty() {
                outer_layer.renderers.clone()
            } else {
                self.renderers
            },
            providers,
        };

        let mut routes = Vec::with_capacity(self.specs.len());
        for spec in self.specs {
            let template = PathTemplate::compile(&spec.path)?.prefixed(&prefix)?;
            let route = Route::new(spec.method, template, spec.handler)
                .with_overrides(spec.overrides)
                .with_router_layer(layer.clone());
            routes.push(route);
        }
        for child in self.children {
            routes.extend(child.into_routes_under(&prefix, &layer)?);
        }
        Ok(routes)
    }
}
