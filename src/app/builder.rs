use std::sync::Arc;

use parking_lot::RwLock;

use super::{AppState, FrameworkConfig};
use crate::cors::CorsConfig;
use crate::csp::CspConfig;
use crate::dispatch::{ErrorDispatcher, ErrorHandlerFn};
use crate::error::Result;
use crate::handler::{Handler, HandlerReturn};
use crate::http::{Method, Request, Response};
use crate::lifecycle::{LifecycleCoordinator, LifecycleState};
use crate::machine::{DecisionMachine, MachineTrace};
use crate::metrics::MetricsRegistry;
use crate::negotiate::{MediaType, Renderer};
use crate::provider::{
    is_builtin, provided, validator_provider, Provider, ProviderArgs, ProviderOutput,
    ProviderRegistry, ProviderScope, ProviderValue,
};
use crate::router::{Route, RouteOverrides, Router, RouteSpec, RouteTable};

/// Composes immutable application configuration. `finalize()` validates
/// the whole graph: template compilation, duplicate routes, provider
/// cycles, unknown parameter names, and CORS invariants.
pub struct ApplicationBuilder {
    specs: Vec<RouteSpec>,
    routers: Vec<Router>,
    registry: ProviderRegistry,
    renderers: Vec<Renderer>,
    error_dispatcher: ErrorDispatcher,
    cors: Option<CorsConfig>,
    csp: Option<CspConfig>,
    config: FrameworkConfig,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            routers: Vec::new(),
            registry: ProviderRegistry::new(),
            renderers: Vec::new(),
            error_dispatcher: ErrorDispatcher::new(),
            cors: None,
            csp: None,
            config: FrameworkConfig::default(),
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

    /// Mount a sub-router; its prefix and policy layer attach to every
    /// contained route.
    pub fn mount(mut self, router: Router) -> Self {
        self.routers.push(router);
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.registry.register(provider);
        self
    }

    /// Register a typed validator-provider for request bodies.
    pub fn validator<T>(self, name: impl Into<String>, target_type: impl Into<String>) -> Self
    where
        T: serde::de::DeserializeOwned + Send + Sync + 'static,
    {
        self.provider(validator_provider::<T>(name, target_type))
    }

    /// Register a global renderer, offered after route renderers.
    pub fn renderer(mut self, renderer: Renderer) -> Self {
        self.renderers.push(renderer);
        self
    }

    pub fn error_handler(
        mut self,
        status: Option<u16>,
        media_type: Option<MediaType>,
        handler: ErrorHandlerFn,
    ) -> Self {
        self.error_dispatcher.register(status, media_type, handler);
        self
    }

    /// Convenience registration for synchronous error-handler bodies.
    pub fn error_handler_fn<F>(
        mut self,
        status: Option<u16>,
        media_type: Option<MediaType>,
        body: F,
    ) -> Self
    where
        F: Fn(Arc<Request>, String) -> Result<HandlerReturn> + Send + Sync + 'static,
    {
        self.error_dispatcher.register_fn(status, media_type, body);
        self
    }

    pub fn cors(mut self, config: CorsConfig) -> Self {
        self.cors = Some(config);
        self
    }

    pub fn csp(mut self, config: CspConfig) -> Self {
        self.csp = Some(config);
        self
    }

    pub fn config(mut self, config: FrameworkConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a startup hook: an application-scope provider whose
    /// value materializes before the first request.
    pub fn on_startup<F>(self, name: impl Into<String>, dependencies: &[&str], body: F) -> Self
    where
        F: Fn(ProviderArgs) -> Result<ProviderValue> + Send + Sync + 'static,
    {
        self.provider(Provider::from_fn(
            name,
            dependencies,
            ProviderScope::Application,
            body,
        ))
    }

    /// Register a shutdown hook: an application-scope generator
    /// provider whose teardown runs at shutdown, in reverse
    /// registration order. Dependencies name the startup providers
    /// whose resources the hook closes over.
    pub fn on_shutdown<F>(self, name: impl Into<String>, dependencies: &[&str], body: F) -> Self
    where
        F: Fn(ProviderArgs) + Send + Sync + 'static,
    {
        let body = Arc::new(body);
        self.provider(Provider::new(
            name,
            dependencies,
            ProviderScope::Application,
            Arc::new(move |args| {
                let body = body.clone();
                Box::pin(async move {
                    Ok(ProviderOutput::with_teardown(
                        provided(()),
                        Box::new(move || {
                            Box::pin(async move {
                                body(args);
                            })
                        }),
                    ))
                })
            }),
        ))
    }

    /// Validate everything and produce the runnable application.
    pub fn finalize(self) -> Result<Application> {
        let mut table = RouteTable::new();

        for spec in self.specs {
            let template = crate::router::PathTemplate::compile(&spec.path)?;
            let route = Route::new(spec.method, template, spec.handler)
                .with_overrides(spec.overrides);
            table.insert(route)?;
        }
        for router in self.routers {
            for route in router.into_routes()? {
                table.insert(route)?;
            }
        }

        // CORS invariants hold at every policy level.
        if let Some(config) = &self.cors {
            config.validate()?;
        }
        for route in table.routes() {
            if let Some(config) = &route.overrides().cors {
                config.validate()?;
            }
            if let Some(config) = &route.router_layer().cors {
                config.validate()?;
            }
        }

        // Provider DAG must be acyclic; unknown dependencies warn.
        self.registry
            .validate_graph(crate::provider::BUILTIN_NAMES)?;

        // Unknown handler parameters warn here and fail the request
        // with 500 if still absent at resolution time.
        for route in table.routes() {
            for param in route.handler().params() {
                let known = is_builtin(param)
                    || self.registry.contains(param)
                    || route.overrides().providers.contains_key(param)
                    || route.router_layer().providers.contains_key(param);
                if !known {
                    tracing::warn!(
                        handler = %route.handler().name(),
                        parameter = %param,
                        "handler parameter matches no provider or built-in"
                    );
                }
            }
        }

        let state = Arc::new(AppState {
            registry: self.registry,
            app_cache: crate::provider::AppScopeCache::new(),
            table,
            global_renderers: self.renderers,
            error_dispatcher: self.error_dispatcher,
            cors: self.cors,
            csp: self.csp,
            config: self.config,
            metrics: MetricsRegistry::new(),
        });

        Ok(Application {
            machine: DecisionMachine::new(state.clone()),
            state,
            lifecycle: RwLock::new(LifecycleState::Created),
        })
    }
}

/// A finalized application: startup, request handling, shutdown.
pub struct Application {
    state: Arc<AppState>,
    machine: DecisionMachine,
    lifecycle: RwLock<LifecycleState>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Materialize application-scope providers. A failure marks the
    /// application failed; no requests are served.
    pub async fn startup(&self) -> Result<()> {
        *self.lifecycle.write() = LifecycleState::Starting;
        match LifecycleCoordinator::startup(&self.state).await {
            Ok(()) => {
                *self.lifecycle.write() = LifecycleState::Running;
                tracing::info!(routes = self.state.table.len(), "application started");
                Ok(())
            }
            Err(err) => {
                *self.lifecycle.write() = LifecycleState::Failed;
                Err(err)
            }
        }
    }

    /// Handle one request through the decision machine.
    pub async fn handle(&self, request: Request) -> Response {
        self.handle_traced(request).await.0
    }

    /// Handle one request and expose the decision trace.
    pub async fn handle_traced(&self, request: Request) -> (Response, MachineTrace) {
        if *self.lifecycle.read() != LifecycleState::Running {
            let response = Response::new(503)
                .with_content_type("text/plain")
                .with_body("Service Unavailable");
            return (response, MachineTrace::new());
        }
        self.machine.run_traced(request).await
    }

    /// Run application-scope teardowns in reverse registration order.
    pub async fn shutdown(&self) {
        *self.lifecycle.write() = LifecycleState::ShuttingDown;
        LifecycleCoordinator::shutdown(&self.state).await;
        *self.lifecycle.write() = LifecycleState::Stopped;
        tracing::info!("application stopped");
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        *self.lifecycle.read()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        self.state.metrics()
    }

    /// Structured description of routes, providers, and validator
    /// targets for external document generators.
    pub fn describe(&self) -> crate::schema::AppSchema {
        crate::schema::describe(&self.state)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebError;
    use serde_json::json;

    fn ok_handler() -> Handler {
        Handler::from_fn("ok", &[], |_| Ok(HandlerReturn::Value(json!({"ok": true}))))
    }

    #[test]
    fn test_duplicate_route_fails_finalize() {
        let result = Application::builder()
            .route(Method::Get, "/users", ok_handler())
            .route(Method::Get, "/users", ok_handler())
            .finalize();
        assert!(matches!(result, Err(WebError::Registration(_))));
    }

    #[test]
    fn test_provider_cycle_fails_finalize() {
        let result = Application::builder()
            .provider(Provider::from_fn(
                "a",
                &["b"],
                ProviderScope::Request,
                |_| Ok(provided(())),
            ))
            .provider(Provider::from_fn(
                "b",
                &["a"],
                ProviderScope::Request,
                |_| Ok(provided(())),
            ))
            .finalize();
        assert!(matches!(result, Err(WebError::Registration(_))));
    }

    #[test]
    fn test_cors_wildcard_credentials_fails_finalize() {
        let result = Application::builder()
            .cors(CorsConfig::any_origin().with_credentials(true))
            .finalize();
        assert!(matches!(result, Err(WebError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_requests_refused_before_startup() {
        let app = Application::builder()
            .route(Method::Get, "/", ok_handler())
            .finalize()
            .unwrap();

        let response = app
            .handle(Request::builder(Method::Get, "/").build())
            .await;
        assert_eq!(response.status(), 503);
        assert_eq!(app.lifecycle_state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn test_startup_failure_refuses_requests() {
        let app = Application::builder()
            .route(Method::Get, "/", ok_handler())
            .on_startup("broken", &[], |_| {
                Err(WebError::Configuration("no database".to_string()))
            })
            .finalize()
            .unwrap();

        assert!(app.startup().await.is_err());
        assert_eq!(app.lifecycle_state(), LifecycleState::Failed);

        let response = app
            .handle(Request::builder(Method::Get, "/").build())
            .await;
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let app = Application::builder()
            .route(Method::Get, "/", ok_handler())
            .finalize()
            .unwrap();

        app.startup().await.unwrap();
        assert_eq!(app.lifecycle_state(), LifecycleState::Running);

        let response = app
            .handle(Request::builder(Method::Get, "/").build())
            .await;
        assert_eq!(response.status(), 200);

        app.shutdown().await;
        assert_eq!(app.lifecycle_state(), LifecycleState::Stopped);
    }
}
