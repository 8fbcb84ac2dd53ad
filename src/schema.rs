// # Schema Export
//
// A structured description of the application surface: routes with
// handler metadata, the provider graph, and validator target types.
// Document generators (OpenAPI and friends) live outside the core and
// consume this instead of poking at internal registries.

use serde::Serialize;

use crate::app::AppState;
use crate::provider::ProviderScope;

#[derive(Debug, Clone, Serialize)]
pub struct RouteSchema {
    pub method: String,
    pub path: String,
    pub handler: String,
    pub parameters: Vec<String>,
    pub path_parameters: Vec<String>,
    pub return_type: Option<String>,
    pub bypass_state_machine: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub name: String,
    pub dependencies: Vec<String>,
    pub scope: String,
    /// Target type for validator-providers; the key request-body
    /// schemas hang off.
    pub validator_target: Option<String>,
}

/// The full export.
#[derive(Debug, Clone, Serialize)]
pub struct AppSchema {
    pub routes: Vec<RouteSchema>,
    pub providers: Vec<ProviderSchema>,
}

impl AppSchema {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn scope_name(scope: ProviderScope) -> &'static str {
    match scope {
        ProviderScope::Request => "request",
        ProviderScope::Application => "application",
    }
}

/// Describe the finalized application.
pub fn describe(state: &AppState) -> AppSchema {
    let routes = state
        .table()
        .routes()
        .iter()
        .map(|route| RouteSchema {
            method: route.method().as_str().to_string(),
            path: route.template().raw().to_string(),
            handler: route.handler().name().to_string(),
            parameters: route.handler().params().to_vec(),
            path_parameters: route
                .template()
                .param_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            return_type: route.handler().return_type().map(str::to_string),
            bypass_state_machine: route.bypasses_state_machine(),
        })
        .collect();

    let providers = state
        .registry()
        .all()
        .iter()
        .map(|provider| ProviderSchema {
            name: provider.name().to_string(),
            dependencies: provider.dependencies().to_vec(),
            scope: scope_name(provider.scope()).to_string(),
            validator_target: provider.validator_target().map(str::to_string),
        })
        .collect();

    AppSchema { routes, providers }
}
