// # Lifecycle Coordination
//
// Startup materializes application-scope providers in dependency order
// and retains their teardowns; shutdown drains the teardowns in reverse
// creation order, logging failures and continuing. A failed startup
// leaves the application refusing requests.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::app::AppState;
use crate::error::Result;
use crate::metrics::RequestMetrics;
use crate::provider::{RequestContext, Resolver, ScopedProviders};

/// Coarse application state, advanced by the lifecycle coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Starting,
    Running,
    ShuttingDown,
    Stopped,
    Failed,
}

/// A hung teardown must not wedge shutdown; anything slower than this
/// is logged and abandoned.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives application-scope provider materialization and teardown.
pub struct LifecycleCoordinator;

impl LifecycleCoordinator {
    /// Resolve every application-scope provider, registration order
    /// outermost, dependencies first. Any failure aborts startup.
    pub async fn startup(state: &AppState) -> Result<()> {
        let resolver = Resolver::new(&state.registry, &state.app_cache);
        let mut ctx = RequestContext::for_startup(Arc::new(RequestMetrics::new()));
        let scoped = ScopedProviders::new();

        for provider in state.registry.application_scope() {
            tracing::info!(provider = %provider.name(), "materializing application-scope provider");
            if let Err(err) = resolver.resolve(provider.name(), &scoped, &mut ctx).await {
                tracing::error!(
                    provider = %provider.name(),
                    error = %err,
                    "startup aborted: application-scope provider failed"
                );
                // Resources acquired before the failure still release.
                ctx.run_teardowns().await;
                Self::run_app_teardowns(state).await;
                return Err(err);
            }
        }

        // Request-scope temporaries created during startup do not
        // outlive it.
        ctx.run_teardowns().await;
        Ok(())
    }

    /// Run application-scope teardowns in reverse creation order; a
    /// failing teardown is logged and the rest still run.
    pub async fn shutdown(state: &AppState) {
        Self::run_app_teardowns(state).await;
    }

    async fn run_app_teardowns(state: &AppState) {
        for (name, teardown) in state.app_cache.drain_teardowns() {
            tracing::info!(provider = %name, "running application-scope teardown");
            let guarded = std::panic::AssertUnwindSafe(teardown()).catch_unwind();
            match tokio::time::timeout(TEARDOWN_TIMEOUT, guarded).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    tracing::error!(provider = %name, "teardown panicked; continuing shutdown");
                }
                Err(_) => {
                    tracing::error!(provider = %name, "teardown timed out; continuing shutdown");
                }
            }
        }
    }
}
