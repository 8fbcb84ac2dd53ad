// # Application
//
// The builder composes immutable configuration (routes, providers,
// renderers, policies, error handlers); `finalize()` validates the
// whole graph and yields the runnable application. `AppState` is the
// shared, read-only view the decision machine executes against.

pub mod builder;

pub use builder::{Application, ApplicationBuilder};

use crate::cors::CorsConfig;
use crate::csp::CspConfig;
use crate::dispatch::ErrorDispatcher;
use crate::metrics::MetricsRegistry;
use crate::negotiate::Renderer;
use crate::provider::{AppScopeCache, ProviderRegistry};
use crate::router::RouteTable;

/// Framework-level tunables.
#[derive(Debug, Clone)]
pub struct FrameworkConfig {
    /// Paths longer than this halt with `414`.
    pub max_uri_length: usize,
    /// Offer `application/json` implicitly for structured returns.
    pub implicit_json_fallback: bool,
    /// Stamp responses with an `X-Request-Id` header.
    pub emit_request_id: bool,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            max_uri_length: 8192,
            implicit_json_fallback: true,
            emit_request_id: true,
        }
    }
}

/// Everything the decision machine reads while serving requests.
/// Construction happens once, in `ApplicationBuilder::finalize`; after
/// startup the only mutable pieces are the caches and metrics, which
/// manage their own synchronization.
pub struct AppState {
    pub(crate) registry: ProviderRegistry,
    pub(crate) app_cache: AppScopeCache,
    pub(crate) table: RouteTable,
    pub(crate) global_renderers: Vec<Renderer>,
    pub(crate) error_dispatcher: ErrorDispatcher,
    pub(crate) cors: Option<CorsConfig>,
    pub(crate) csp: Option<CspConfig>,
    pub(crate) config: FrameworkConfig,
    pub(crate) metrics: MetricsRegistry,
}

impl AppState {
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The CORS policy that governs a path: the most specific policy of
    /// any route on the path, falling back to the app-level policy.
    /// Used for preflights, which arrive as `OPTIONS` and match no
    /// route of their own.
    pub(crate) fn cors_for_path(&self, path: &str) -> Option<CorsConfig> {
        for route in self.table.routes() {
            if route.template().matches(path).is_some() {
                return route.effective_cors(self.cors.as_ref()).cloned();
            }
        }
        self.cors.clone()
    }

    /// The CSP policy for a path with the same fallback shape.
    pub(crate) fn csp_for_path(&self, path: &str) -> Option<CspConfig> {
        for route in self.table.routes() {
            if route.template().matches(path).is_some() {
                return route.effective_csp(self.csp.as_ref()).cloned();
            }
        }
        self.csp.clone()
    }
}
