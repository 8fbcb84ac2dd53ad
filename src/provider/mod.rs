// # Provider Registry & Resolver
//
// The dependency-injection graph at the heart of the framework. A
// provider is a named, lazily-evaluated computation whose result is
// injected by parameter name into dependents: other providers, route
// handlers, decision-point overrides, and error handlers.
//
// ## Modules
//
// - **value**: type-erased provider values and named argument sets
// - **registry**: provider definitions, the DAG, cycle validation
// - **resolver**: lazy memoized resolution over request/application scopes
// - **builtin**: always-available request-derived providers
// - **validator**: typed request-body validator-providers
//
// Scope rules: `request` values cache for exactly one request;
// `application` values materialize at startup and live until shutdown.
// Generator-form providers register teardowns that run when the owning
// scope ends, in reverse creation order.

pub mod builtin;
pub mod registry;
pub mod resolver;
pub mod validator;
pub mod value;

pub use builtin::{is_builtin, resolve_builtin, BUILTIN_NAMES};
pub use registry::{
    OutboundCheck, Provider, ProviderFn, ProviderFuture, ProviderOutput, ProviderRegistry,
    ProviderScope, TeardownFn, TeardownFuture,
};
pub use resolver::{AppScopeCache, RequestContext, RequestScope, Resolver, ScopedProviders};
pub use validator::validator_provider;
pub use value::{provided, value_is_truthy, ProviderArgs, ProviderValue};
