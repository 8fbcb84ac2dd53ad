use std::collections::HashMap;
use std::sync::Arc;

use super::template::PathTemplate;
use crate::cors::CorsConfig;
use crate::csp::CspConfig;
use crate::handler::Handler;
use crate::http::Method;
use crate::negotiate::Renderer;
use crate::provider::Provider;

/// Per-route policy overrides. A set field replaces the corresponding
/// router- or app-level policy wholesale; nothing merges.
#[derive(Clone, Default)]
pub struct RouteOverrides {
    pub cors: Option<CorsConfig>,
    pub csp: Option<CspConfig>,
    pub renderers: Vec<Renderer>,
    /// Route-scoped providers: resource state (`resource_exists`,
    /// `etag`, `last_modified`), auth predicates, and anything else the
    /// handler's parameters name.
    pub providers: HashMap<String, Arc<Provider>>,
    /// Decision-point overrides registered directly on the route; these
    /// outrank a route-scoped provider of the same name.
    pub decision_overrides: HashMap<String, Arc<Provider>>,
    /// Skip decision points 2-13 for latency-critical endpoints.
    pub bypass_state_machine: bool,
}

impl std::fmt::Debug for RouteOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteOverrides")
            .field("cors", &self.cors.is_some())
            .field("csp", &self.csp.is_some())
            .field("renderers", &self.renderers.len())
            .field("providers", &self.providers.keys())
            .field("decision_overrides", &self.decision_overrides.keys())
            .field("bypass_state_machine", &self.bypass_state_machine)
            .finish()
    }
}

/// Policy layer inherited from the enclosing router when the route was
/// mounted; empty for routes registered directly on the application.
#[derive(Clone, Default)]
pub struct PolicyLayer {
    pub cors: Option<CorsConfig>,
    pub csp: Option<CspConfig>,
    pub renderers: Vec<Renderer>,
    pub providers: HashMap<String, Arc<Provider>>,
}

/// A registered route: method, compiled template, handler, and the
/// policy stack it resolves against.
#[derive(Clone)]
pub struct Route {
    method: Method,
    template: PathTemplate,
    handler: Arc<Handler>,
    overrides: RouteOverrides,
    router_layer: PolicyLayer,
}

impl Route {
    pub fn new(method: Method, template: PathTemplate, handler: Handler) -> Self {
        Self {
            method,
            template,
            handler: Arc::new(handler),
            overrides: RouteOverrides::default(),
            router_layer: PolicyLayer::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: RouteOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub(crate) fn with_router_layer(mut self, layer: PolicyLayer) -> Self {
        self.router_layer = layer;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    pub fn overrides(&self) -> &RouteOverrides {
        &self.overrides
    }

    pub fn router_layer(&self) -> &PolicyLayer {
        &self.router_layer
    }

    pub fn bypasses_state_machine(&self) -> bool {
        self.overrides.bypass_state_machine
    }

    /// Effective CORS policy: route overrides router overrides the
    /// app-level fallback the caller supplies.
    pub fn effective_cors<'a>(&'a self, app: Option<&'a CorsConfig>) -> Option<&'a CorsConfig> {
        self.overrides
            .cors
            .as_ref()
            .or(self.router_layer.cors.as_ref())
            .or(app)
    }

    /// Effective CSP policy with the same precedence.
    pub fn effective_csp<'a>(&'a self, app: Option<&'a CspConfig>) -> Option<&'a CspConfig> {
        self.overrides
            .csp
            .as_ref()
            .or(self.router_layer.csp.as_ref())
            .or(app)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template.raw())
            .field("handler", &self.handler.name())
            .field("bypass", &self.overrides.bypass_state_machine)
            .finish()
    }
}
