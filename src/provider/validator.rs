use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::registry::{Provider, ProviderScope};
use super::value::provided;
use crate::error::{FieldErrors, Result, WebError};

/// Build a validator-provider for a target type.
///
/// The provider parses the decoded JSON body into `T`, failing with a
/// structured field→message map. The declared target type name keys
/// schema export and outbound return-shape validation; the resolver
/// injects the typed value under the provider's name.
pub fn validator_provider<T>(name: impl Into<String>, target_type: impl Into<String>) -> Provider
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let provider = Provider::from_fn(
        name,
        &["json_body"],
        ProviderScope::Request,
        |args| {
            let body = args.json("json_body")?;
            let typed: T = serde_json::from_value((*body).clone())
                .map_err(|e| WebError::Validation(classify_serde_error(&e.to_string())))?;
            Ok(provided(typed))
        },
    );

    provider.with_validator_target(
        target_type,
        Arc::new(|value: &serde_json::Value| {
            serde_json::from_value::<T>(value.clone())
                .map(|_| ())
                .map_err(|e| WebError::Internal(format!(
                    "handler return failed outbound validation: {}",
                    e
                )))
        }),
    )
}

/// Turn a serde decode message into field-level details. Serde reports
/// missing and unknown fields by name; everything else lands on the
/// body itself.
fn classify_serde_error(message: &str) -> FieldErrors {
    let mut fields = FieldErrors::new();

    if let Some(field) = quoted_field(message, "missing field `") {
        fields.push(field, "field is required");
    } else if let Some(field) = quoted_field(message, "unknown field `") {
        fields.push(field, "field is not recognized");
    } else if let Some(field) = quoted_field(message, "duplicate field `") {
        fields.push(field, "field appears more than once");
    } else {
        let detail = message
            .split(" at line ")
            .next()
            .unwrap_or(message)
            .to_string();
        fields.push("body", detail);
    }

    fields
}

fn quoted_field(message: &str, prefix: &str) -> Option<String> {
    let start = message.find(prefix)? + prefix.len();
    let rest = &message[start..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Request};
    use crate::metrics::RequestMetrics;
    use crate::provider::registry::ProviderRegistry;
    use crate::provider::resolver::{AppScopeCache, RequestContext, Resolver, ScopedProviders};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct CreateUser {
        name: String,
        age: u32,
    }

    fn ctx_with_body(body: serde_json::Value) -> RequestContext {
        let request = Request::builder(Method::Post, "/users").json(&body).build();
        RequestContext::for_request(Arc::new(request), Arc::new(RequestMetrics::new()))
    }

    #[tokio::test]
    async fn test_valid_body_produces_typed_value() {
        let mut registry = ProviderRegistry::new();
        registry.register(validator_provider::<CreateUser>("create_user", "CreateUser"));

        let app_cache = AppScopeCache::new();
        let resolver = Resolver::new(&registry, &app_cache);
        let mut ctx = ctx_with_body(json!({"name": "alice", "age": 30}));

        let value = resolver
            .resolve("create_user", &ScopedProviders::new(), &mut ctx)
            .await
            .unwrap();
        let user = value.downcast::<CreateUser>().unwrap();
        assert_eq!(user.name, "alice");
        assert_eq!(user.age, 30);
    }

    #[tokio::test]
    async fn test_missing_field_reports_field_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(validator_provider::<CreateUser>("create_user", "CreateUser"));

        let app_cache = AppScopeCache::new();
        let resolver = Resolver::new(&registry, &app_cache);
        let mut ctx = ctx_with_body(json!({"name": "alice"}));

        let err = resolver
            .resolve("create_user", &ScopedProviders::new(), &mut ctx)
            .await
            .unwrap_err();
        let fields = err.field_errors().expect("validation failure");
        assert_eq!(
            fields.0.get("age").map(String::as_str),
            Some("field is required")
        );
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_wrong_type_reports_body_detail() {
        let mut registry = ProviderRegistry::new();
        registry.register(validator_provider::<CreateUser>("create_user", "CreateUser"));

        let app_cache = AppScopeCache::new();
        let resolver = Resolver::new(&registry, &app_cache);
        let mut ctx = ctx_with_body(json!({"name": "alice", "age": "old"}));

        let err = resolver
            .resolve("create_user", &ScopedProviders::new(), &mut ctx)
            .await
            .unwrap_err();
        let fields = err.field_errors().expect("validation failure");
        assert!(fields.0.contains_key("body"));
    }

    #[test]
    fn test_outbound_check_round_trip() {
        let provider = validator_provider::<CreateUser>("create_user", "CreateUser");
        assert_eq!(provider.validator_target(), Some("CreateUser"));

        let check = provider.outbound_check().unwrap();
        assert!(check(&json!({"name": "bob", "age": 4})).is_ok());

        let err = check(&json!({"name": "bob"})).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_classify_unknown_field() {
        let fields =
            classify_serde_error("unknown field `extra`, expected `name` or `age` at line 1");
        assert_eq!(
            fields.0.get("extra").map(String::as_str),
            Some("field is not recognized")
        );
    }
}
