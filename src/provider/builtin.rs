use super::resolver::RequestContext;
use super::value::{provided, ProviderValue};
use crate::error::Result;

/// Names resolvable without registration. Handlers and providers may
/// declare any of these as parameters.
pub const BUILTIN_NAMES: &[&str] = &[
    "request",
    "path_params",
    "query_params",
    "headers",
    "json_body",
    "body",
    "metrics",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Resolve a built-in against the current request context. Returns
/// `None` for names this module does not own.
pub fn resolve_builtin(name: &str, ctx: &RequestContext) -> Option<Result<ProviderValue>> {
    if !is_builtin(name) {
        return None;
    }
    Some(builtin_value(name, ctx))
}

fn builtin_value(name: &str, ctx: &RequestContext) -> Result<ProviderValue> {
    match name {
        "request" => {
            let request = ctx.request()?;
            Ok(request.clone() as ProviderValue)
        }
        "path_params" => {
            let request = ctx.request()?;
            Ok(provided(request.path_params().clone()))
        }
        "query_params" => {
            let request = ctx.request()?;
            Ok(provided(request.query_params().clone()))
        }
        "headers" => {
            let request = ctx.request()?;
            Ok(provided(request.headers().clone()))
        }
        "json_body" => {
            let request = ctx.request()?;
            let value = request.json_body()?;
            Ok(value as ProviderValue)
        }
        "body" => {
            let request = ctx.request()?;
            Ok(provided(request.body().clone()))
        }
        "metrics" => Ok(ctx.metrics.clone() as ProviderValue),
        _ => unreachable!("is_builtin gates the name set"),
    }
}
