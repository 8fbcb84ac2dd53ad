use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::value::{provided, ProviderArgs, ProviderValue};
use crate::error::{Result, WebError};

/// Lifetime domain of a provider's cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderScope {
    /// Resolved at most once per request; cache dropped at request end.
    Request,
    /// Resolved once at startup; cache lives until shutdown.
    Application,
}

pub type ProviderFuture = Pin<Box<dyn Future<Output = Result<ProviderOutput>> + Send>>;
pub type ProviderFn = Arc<dyn Fn(ProviderArgs) -> ProviderFuture + Send + Sync>;
pub type TeardownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type TeardownFn = Box<dyn FnOnce() -> TeardownFuture + Send>;

/// What a provider invocation yields: the value, plus an optional
/// teardown that runs when the owning scope ends.
pub struct ProviderOutput {
    pub value: ProviderValue,
    pub teardown: Option<TeardownFn>,
}

impl ProviderOutput {
    pub fn value(value: ProviderValue) -> Self {
        Self {
            value,
            teardown: None,
        }
    }

    /// Generator-form output: acquire now, release at scope end.
    pub fn with_teardown(value: ProviderValue, teardown: TeardownFn) -> Self {
        Self {
            value,
            teardown: Some(teardown),
        }
    }
}

/// Outbound shape check attached to validator-providers.
pub type OutboundCheck = Arc<dyn Fn(&serde_json::Value) -> Result<()> + Send + Sync>;

/// A named, lazily-evaluated computation in the dependency graph.
pub struct Provider {
    name: String,
    dependencies: Vec<String>,
    scope: ProviderScope,
    func: ProviderFn,
    /// Target type name for validator-providers; the key for schema
    /// export and outbound validation.
    validator_target: Option<String>,
    outbound_check: Option<OutboundCheck>,
}

impl Provider {
    pub fn new(
        name: impl Into<String>,
        dependencies: &[&str],
        scope: ProviderScope,
        func: ProviderFn,
    ) -> Self {
        Self {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            scope,
            func,
            validator_target: None,
            outbound_check: None,
        }
    }

    /// Convenience constructor for providers whose body is a plain
    /// async-free computation over resolved arguments.
    pub fn from_fn<F>(
        name: impl Into<String>,
        dependencies: &[&str],
        scope: ProviderScope,
        body: F,
    ) -> Self
    where
        F: Fn(ProviderArgs) -> Result<ProviderValue> + Send + Sync + 'static,
    {
        let body = Arc::new(body);
        Self::new(
            name,
            dependencies,
            scope,
            Arc::new(move |args| {
                let body = body.clone();
                Box::pin(async move { Ok(ProviderOutput::value(body(args)?)) })
            }),
        )
    }

    /// Constant-valued provider; useful for decision-point overrides.
    pub fn constant<T: Clone + Send + Sync + 'static>(
        name: impl Into<String>,
        scope: ProviderScope,
        value: T,
    ) -> Self {
        Self::from_fn(name, &[], scope, move |_| Ok(provided(value.clone())))
    }

    pub(crate) fn with_validator_target(
        mut self,
        target: impl Into<String>,
        check: OutboundCheck,
    ) -> Self {
        self.validator_target = Some(target.into());
        self.outbound_check = Some(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn scope(&self) -> ProviderScope {
        self.scope
    }

    pub fn func(&self) -> ProviderFn {
        self.func.clone()
    }

    pub fn validator_target(&self) -> Option<&str> {
        self.validator_target.as_deref()
    }

    pub fn outbound_check(&self) -> Option<OutboundCheck> {
        self.outbound_check.clone()
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("scope", &self.scope)
            .field("validator_target", &self.validator_target)
            .finish()
    }
}

/// Registry of named providers forming a DAG keyed by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<Provider>>,
    registration_order: Vec<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            registration_order: Vec::new(),
        }
    }

    /// Register a provider. A duplicate name replaces the earlier
    /// registration and moves it to the end of the ordering.
    pub fn register(&mut self, provider: Provider) {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            tracing::warn!(provider = %name, "provider re-registered; replacing earlier definition");
            self.registration_order.retain(|existing| existing != &name);
        }
        self.registration_order.push(name.clone());
        self.providers.insert(name, Arc::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Application-scope providers in registration order; startup
    /// materializes them in this order (dependencies resolve first
    /// regardless) and shutdown tears down in reverse.
    pub fn application_scope(&self) -> Vec<Arc<Provider>> {
        self.registration_order
            .iter()
            .filter_map(|name| self.providers.get(name))
            .filter(|provider| provider.scope() == ProviderScope::Application)
            .cloned()
            .collect()
    }

    /// All providers in registration order.
    pub fn all(&self) -> Vec<Arc<Provider>> {
        self.registration_order
            .iter()
            .filter_map(|name| self.providers.get(name))
            .cloned()
            .collect()
    }

    /// Provider name registered for a validator target type, if any.
    pub fn validator_for_target(&self, target: &str) -> Option<Arc<Provider>> {
        self.registration_order
            .iter()
            .filter_map(|name| self.providers.get(name))
            .find(|provider| provider.validator_target() == Some(target))
            .cloned()
    }

    /// Validate the dependency graph: reject cycles, produce a
    /// deterministic topological order for diagnostics, and warn about
    /// dependency names that resolve neither to a provider nor to a
    /// built-in.
    pub fn validate_graph(&self, builtin_names: &[&str]) -> Result<Vec<String>> {
        let builtin: HashSet<&str> = builtin_names.iter().copied().collect();
        let mut order = Vec::new();
        let mut finished: HashSet<String> = HashSet::new();
        let mut visiting: HashSet<String> = HashSet::new();

        for root in &self.registration_order {
            if finished.contains(root) {
                continue;
            }
            // Iterative DFS; the visiting set doubles as the cycle probe.
            let mut stack: Vec<(String, usize)> = vec![(root.clone(), 0)];
            visiting.insert(root.clone());

            while let Some((name, dep_index)) = stack.pop() {
                let provider = match self.providers.get(&name) {
                    Some(provider) => provider.clone(),
                    None => {
                        // Unknown dependency: warned below at the edge.
                        visiting.remove(&name);
                        finished.insert(name);
                        continue;
                    }
                };

                match provider.dependencies().get(dep_index) {
                    Some(dep) => {
                        stack.push((name.clone(), dep_index + 1));
                        if finished.contains(dep) || builtin.contains(dep.as_str()) {
                            continue;
                        }
                        if visiting.contains(dep) {
                            return Err(WebError::Registration(format!(
                                "provider dependency cycle through: {} -> {}",
                                name, dep
                            )));
                        }
                        if !self.providers.contains_key(dep) {
                            tracing::warn!(
                                provider = %name,
                                dependency = %dep,
                                "dependency is neither a provider nor a built-in; \
                                 resolution will fail at runtime"
                            );
                            finished.insert(dep.clone());
                            continue;
                        }
                        visiting.insert(dep.clone());
                        stack.push((dep.clone(), 0));
                    }
                    None => {
                        visiting.remove(&name);
                        if finished.insert(name.clone()) {
                            order.push(name);
                        }
                    }
                }
            }
        }

        Ok(order)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("registered", &self.registration_order)
            .finish()
    }
}
