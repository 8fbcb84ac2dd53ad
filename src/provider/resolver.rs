use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::builtin::{is_builtin, resolve_builtin};
use super::registry::{Provider, ProviderRegistry, ProviderScope, TeardownFn};
use super::value::{ProviderArgs, ProviderValue};
use crate::error::{Result, WebError};
use crate::http::Request;
use crate::metrics::RequestMetrics;

/// Application-scope cache. Written during startup (and by lazily
/// resolved application providers), read for the rest of the process
/// lifetime. Teardowns accumulate in creation order and drain in
/// reverse at shutdown.
#[derive(Default)]
pub struct AppScopeCache {
    values: RwLock<HashMap<String, ProviderValue>>,
    teardowns: Mutex<Vec<(String, TeardownFn)>>,
}

impl AppScopeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<ProviderValue> {
        self.values.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    pub fn insert(&self, name: &str, value: ProviderValue) {
        self.values.write().insert(name.to_string(), value);
    }

    pub fn push_teardown(&self, name: &str, teardown: TeardownFn) {
        self.teardowns.lock().push((name.to_string(), teardown));
    }

    /// Remove all teardowns, most recently created first.
    pub fn drain_teardowns(&self) -> Vec<(String, TeardownFn)> {
        let mut drained: Vec<(String, TeardownFn)> =
            self.teardowns.lock().drain(..).collect();
        drained.reverse();
        drained
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

/// Request-scope cache and teardown list. Single-owner; dropped (after
/// teardown) when the request completes.
#[derive(Default)]
pub struct RequestScope {
    values: HashMap<String, ProviderValue>,
    teardowns: Vec<(String, TeardownFn)>,
}

impl RequestScope {
    pub fn get(&self, name: &str) -> Option<ProviderValue> {
        self.values.get(name).cloned()
    }

    pub fn insert(&mut self, name: &str, value: ProviderValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn push_teardown(&mut self, name: &str, teardown: TeardownFn) {
        self.teardowns.push((name.to_string(), teardown));
    }

    fn drain_teardowns(&mut self) -> Vec<(String, TeardownFn)> {
        let mut drained: Vec<(String, TeardownFn)> = self.teardowns.drain(..).collect();
        drained.reverse();
        drained
    }
}

// Host cancellation drops the request future before the completion
// path runs its teardowns; pending ones still release, spawned onto
// the running runtime, most recently created first.
impl Drop for RequestScope {
    fn drop(&mut self) {
        if self.teardowns.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                for (name, teardown) in self.teardowns.drain(..).rev() {
                    tracing::debug!(
                        provider = %name,
                        "request scope dropped with pending teardown; spawning release"
                    );
                    handle.spawn(teardown());
                }
            }
            Err(_) => {
                tracing::warn!(
                    pending = self.teardowns.len(),
                    "request scope dropped with pending teardowns and no runtime"
                );
            }
        }
    }
}

/// Per-invocation resolution context: the request (absent during
/// startup resolution), the request-scope cache, and the per-request
/// metrics recorder.
pub struct RequestContext {
    request: Option<Arc<Request>>,
    pub metrics: Arc<RequestMetrics>,
    pub(crate) scope: RequestScope,
}

impl RequestContext {
    pub fn for_request(request: Arc<Request>, metrics: Arc<RequestMetrics>) -> Self {
        Self {
            request: Some(request),
            metrics,
            scope: RequestScope::default(),
        }
    }

    /// Context used while materializing application-scope providers at
    /// startup; request built-ins are unavailable.
    pub fn for_startup(metrics: Arc<RequestMetrics>) -> Self {
        Self {
            request: None,
            metrics,
            scope: RequestScope::default(),
        }
    }

    pub fn request(&self) -> Result<&Arc<Request>> {
        self.request.as_ref().ok_or_else(|| {
            WebError::Configuration(
                "request-scoped built-in resolved outside a request".to_string(),
            )
        })
    }

    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    /// Run request-scope teardowns, most recently created first. Always
    /// called at request end, including on halt and cancellation paths.
    pub async fn run_teardowns(&mut self) {
        for (name, teardown) in self.scope.drain_teardowns() {
            tracing::debug!(provider = %name, "running request-scope teardown");
            teardown().await;
        }
    }
}

/// Route- and router-scoped provider layers consulted before the
/// application registry, most specific first.
#[derive(Clone, Default)]
pub struct ScopedProviders {
    layers: Vec<Arc<HashMap<String, Arc<Provider>>>>,
}

impl ScopedProviders {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Push a layer below the existing ones (call from most specific to
    /// least specific).
    pub fn push_layer(&mut self, layer: Arc<HashMap<String, Arc<Provider>>>) {
        self.layers.push(layer);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Provider>> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(name).cloned())
    }
}

/// Lazy, memoized provider resolution over the registry, the scoped
/// layers, and the built-ins.
///
/// Resolution is an iterative depth-first walk with an explicit stack
/// and a visiting set; a cycle that survived registration validation
/// (possible through scoped layers) fails here instead of recursing.
pub struct Resolver<'a> {
    registry: &'a ProviderRegistry,
    app_cache: &'a AppScopeCache,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ProviderRegistry, app_cache: &'a AppScopeCache) -> Self {
        Self {
            registry,
            app_cache,
        }
    }

    fn cached(&self, name: &str, ctx: &RequestContext) -> Option<ProviderValue> {
        self.app_cache
            .get(name)
            .or_else(|| ctx.scope.get(name))
    }

    fn lookup(&self, name: &str, scoped: &ScopedProviders) -> Option<Arc<Provider>> {
        scoped.lookup(name).or_else(|| self.registry.get(name))
    }

    /// Resolve one name to a value, materializing dependencies first.
    pub async fn resolve(
        &self,
        name: &str,
        scoped: &ScopedProviders,
        ctx: &mut RequestContext,
    ) -> Result<ProviderValue> {
        if let Some(value) = self.cached(name, ctx) {
            return Ok(value);
        }

        let mut stack: Vec<String> = vec![name.to_string()];
        let mut visiting: HashSet<String> = HashSet::new();
        visiting.insert(name.to_string());

        while let Some(top) = stack.last().cloned() {
            if self.cached(&top, ctx).is_some() {
                visiting.remove(&top);
                stack.pop();
                continue;
            }

            if is_builtin(&top) {
                let value = match resolve_builtin(&top, ctx) {
                    Some(result) => result?,
                    None => {
                        return Err(WebError::Provider(format!(
                            "built-in lookup failed for: {}",
                            top
                        )))
                    }
                };
                ctx.scope.insert(&top, value);
                continue;
            }

            let provider = self.lookup(&top, scoped).ok_or_else(|| {
                WebError::Provider(format!("unknown provider: {}", top))
            })?;

            let unresolved = provider
                .dependencies()
                .iter()
                .find(|dep| self.cached(dep, ctx).is_none())
                .cloned();

            if let Some(dep) = unresolved {
                if visiting.contains(&dep) {
                    return Err(WebError::Registration(format!(
                        "provider dependency cycle through: {} -> {}",
                        top, dep
                    )));
                }
                visiting.insert(dep.clone());
                stack.push(dep);
                continue;
            }

            self.invoke(&provider, ctx).await?;
        }

        self.cached(name, ctx).ok_or_else(|| {
            WebError::Provider(format!("resolution produced no value for: {}", name))
        })
    }

    /// Invoke a provider whose dependencies are all cached, then cache
    /// its value in the matching scope and record any teardown.
    async fn invoke(&self, provider: &Provider, ctx: &mut RequestContext) -> Result<()> {
        let mut args = ProviderArgs::new();
        for dep in provider.dependencies() {
            let value = self.cached(dep, ctx).ok_or_else(|| {
                WebError::Provider(format!(
                    "dependency vanished during resolution: {}",
                    dep
                ))
            })?;
            args.insert(dep.clone(), value);
        }

        tracing::trace!(provider = %provider.name(), "invoking provider");
        let output = (provider.func())(args).await?;

        match provider.scope() {
            ProviderScope::Application => {
                self.app_cache.insert(provider.name(), output.value);
                if let Some(teardown) = output.teardown {
                    self.app_cache.push_teardown(provider.name(), teardown);
                }
            }
            ProviderScope::Request => {
                ctx.scope.insert(provider.name(), output.value);
                if let Some(teardown) = output.teardown {
                    ctx.scope.push_teardown(provider.name(), teardown);
                }
            }
        }
        Ok(())
    }

    /// Resolve a named parameter list into an argument set; the path
    /// used for handler and error-handler invocation.
    pub async fn resolve_args(
        &self,
        params: &[String],
        scoped: &ScopedProviders,
        ctx: &mut RequestContext,
    ) -> Result<ProviderArgs> {
        let mut args = ProviderArgs::new();
        for param in params {
            let value = self.resolve(param, scoped, ctx).await?;
            args.insert(param.clone(), value);
        }
        Ok(args)
    }
}
