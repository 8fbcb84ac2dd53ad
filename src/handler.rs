use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::http::Response;
use crate::provider::ProviderArgs;

/// What a handler hands back to the machine, modeled as a tagged union
/// so rendering logic dispatches on shape instead of sniffing runtime
/// types.
#[derive(Debug)]
pub enum HandlerReturn {
    /// Explicit no-content; emits `204` with no body.
    NoContent,
    /// A structured value for the selected renderer; emits `200`.
    Value(serde_json::Value),
    /// A structured value with an explicit status.
    ValueStatus(serde_json::Value, u16),
    /// A structured value with status and extra headers.
    ValueStatusHeaders(serde_json::Value, u16, Vec<(String, String)>),
    /// A fully-built response, used as-is apart from computed-validator
    /// decoration.
    Response(Response),
}

impl From<serde_json::Value> for HandlerReturn {
    fn from(value: serde_json::Value) -> Self {
        HandlerReturn::Value(value)
    }
}

impl From<Response> for HandlerReturn {
    fn from(response: Response) -> Self {
        HandlerReturn::Response(response)
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HandlerReturn>> + Send>>;
pub type HandlerFn = Arc<dyn Fn(ProviderArgs) -> HandlerFuture + Send + Sync>;

/// A route handler: a name (the injection key for its return value in
/// the renderer contract), declared parameter names resolved through
/// the provider graph, and an optional return-type name that triggers
/// outbound validation when a validator-provider declares that target.
#[derive(Clone)]
pub struct Handler {
    name: String,
    params: Vec<String>,
    return_type: Option<String>,
    func: HandlerFn,
}

impl Handler {
    pub fn new(name: impl Into<String>, params: &[&str], func: HandlerFn) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            return_type: None,
            func,
        }
    }

    /// Convenience constructor for synchronous handler bodies.
    pub fn from_fn<F>(name: impl Into<String>, params: &[&str], body: F) -> Self
    where
        F: Fn(ProviderArgs) -> Result<HandlerReturn> + Send + Sync + 'static,
    {
        let body = Arc::new(body);
        Self::new(
            name,
            params,
            Arc::new(move |args| {
                let body = body.clone();
                Box::pin(async move { body(args) })
            }),
        )
    }

    /// Declare the return type name used for outbound validation and
    /// schema export.
    pub fn with_return_type(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    pub async fn invoke(&self, args: ProviderArgs) -> Result<HandlerReturn> {
        (self.func)(args).await
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_invoke_sync_body() {
        let handler = Handler::from_fn("echo", &[], |_args| {
            Ok(HandlerReturn::Value(json!({"ok": true})))
        });

        let result = handler.invoke(ProviderArgs::new()).await.unwrap();
        match result {
            HandlerReturn::Value(value) => assert_eq!(value["ok"], true),
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_return_type_declaration() {
        let handler = Handler::from_fn("create", &["create_user"], |_| {
            Ok(HandlerReturn::NoContent)
        })
        .with_return_type("UserRecord");

        assert_eq!(handler.return_type(), Some("UserRecord"));
        assert_eq!(handler.params(), &["create_user".to_string()]);
    }

    #[test]
    fn test_from_conversions() {
        assert!(matches!(
            HandlerReturn::from(json!(1)),
            HandlerReturn::Value(_)
        ));
        assert!(matches!(
            HandlerReturn::from(Response::new(201)),
            HandlerReturn::Response(_)
        ));
    }
}
