// CORS & CSP Integration Tests
// Preflight synthesis, actual-request decoration, policy inheritance
// through mounted routers, nonce generation, and header emission.

use serde_json::json;

use rusty_rest::cors::CorsConfig;
use rusty_rest::csp::{CspConfig, CspSource, CSP_NONCE_KEY};
use rusty_rest::handler::{Handler, HandlerReturn};
use rusty_rest::http::{Method, Request};
use rusty_rest::router::RouteOverrides;
use rusty_rest::{Application, Router};

fn ok_handler(name: &str) -> Handler {
    Handler::from_fn(name, &[], |_| Ok(HandlerReturn::Value(json!({"ok": true}))))
}

async fn started(builder: rusty_rest::ApplicationBuilder) -> Application {
    let app = builder.finalize().expect("finalize");
    app.startup().await.expect("startup");
    app
}

#[tokio::test]
async fn test_preflight_synthesis() {
    let app = started(
        Application::builder()
            .cors(
                CorsConfig::allow_origins(["https://app.example"]).with_credentials(true),
            )
            .route(Method::Post, "/api/x", ok_handler("create_x")),
    )
    .await;

    let response = app
        .handle(
            Request::builder(Method::Options, "/api/x")
                .header("Origin", "https://app.example")
                .header("Access-Control-Request-Method", "POST")
                .build(),
        )
        .await;

    assert_eq!(response.status(), 204);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin"),
        Some("https://app.example")
    );
    assert_eq!(headers.get("access-control-allow-credentials"), Some("true"));
    assert_eq!(headers.get("vary"), Some("Origin"));
    assert_eq!(
        headers.get("access-control-allow-methods"),
        Some("OPTIONS, POST")
    );
}

#[tokio::test]
async fn test_preflight_unmatched_origin_falls_back_to_allow() {
    let app = started(
        Application::builder()
            .cors(CorsConfig::allow_origins(["https://app.example"]))
            .route(Method::Post, "/api/x", ok_handler("create_x")),
    )
    .await;

    let response = app
        .handle(
            Request::builder(Method::Options, "/api/x")
                .header("Origin", "https://evil.example")
                .header("Access-Control-Request-Method", "POST")
                .build(),
        )
        .await;

    // No CORS headers for the unmatched origin; the OPTIONS probe still
    // answers with the route's own Allow set.
    assert_eq!(response.status(), 204);
    assert!(!response.headers().contains("access-control-allow-origin"));
    assert_eq!(response.headers().get("allow"), Some("OPTIONS, POST"));
}

#[tokio::test]
async fn test_plain_options_returns_allow_set() {
    let app = started(
        Application::builder()
            .route(Method::Get, "/things", ok_handler("list"))
            .route(Method::Post, "/things", ok_handler("create")),
    )
    .await;

    let response = app
        .handle(Request::builder(Method::Options, "/things").build())
        .await;
    assert_eq!(response.status(), 204);
    assert_eq!(response.headers().get("allow"), Some("GET, OPTIONS, POST"));
}

#[tokio::test]
async fn test_actual_request_decoration() {
    let app = started(
        Application::builder()
            .cors(
                CorsConfig::allow_origins(["https://app.example"])
                    .with_credentials(true)
                    .with_expose_headers(["x-request-id"]),
            )
            .route(Method::Get, "/api/data", ok_handler("data")),
    )
    .await;

    let matched = app
        .handle(
            Request::builder(Method::Get, "/api/data")
                .header("Origin", "https://app.example")
                .build(),
        )
        .await;
    assert_eq!(matched.status(), 200);
    let headers = matched.headers();
    assert_eq!(
        headers.get("access-control-allow-origin"),
        Some("https://app.example")
    );
    assert_eq!(headers.get("access-control-allow-credentials"), Some("true"));
    assert_eq!(
        headers.get("access-control-expose-headers"),
        Some("x-request-id")
    );
    assert_eq!(headers.get("vary"), Some("Origin"));

    let unmatched = app
        .handle(
            Request::builder(Method::Get, "/api/data")
                .header("Origin", "https://evil.example")
                .build(),
        )
        .await;
    assert_eq!(unmatched.status(), 200);
    assert!(!unmatched.headers().contains("access-control-allow-origin"));
}

#[tokio::test]
async fn test_error_responses_still_carry_cors() {
    let app = started(
        Application::builder()
            .cors(CorsConfig::allow_origins(["https://app.example"]))
            .route(Method::Get, "/api/data", ok_handler("data")),
    )
    .await;

    let response = app
        .handle(
            Request::builder(Method::Get, "/api/missing")
                .header("Origin", "https://app.example")
                .build(),
        )
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers().get("access-control-allow-origin"),
        Some("https://app.example")
    );
    assert_eq!(response.headers().get("vary"), Some("Origin"));
}

#[tokio::test]
async fn test_router_cors_inheritance_and_route_override() {
    let route_override = {
        let mut overrides = RouteOverrides::default();
        overrides.cors = Some(CorsConfig::allow_origins(["https://special.example"]));
        overrides
    };

    let app = started(
        Application::builder()
            .cors(CorsConfig::allow_origins(["https://app.example"]))
            .mount(
                Router::new("/api")
                    .cors(CorsConfig::allow_origins(["https://api.example"]))
                    .route(Method::Get, "/inherited", ok_handler("inherited"))
                    .route_with(
                        Method::Get,
                        "/overridden",
                        ok_handler("overridden"),
                        route_override,
                    ),
            ),
    )
    .await;

    let inherited = app
        .handle(
            Request::builder(Method::Get, "/api/inherited")
                .header("Origin", "https://api.example")
                .build(),
        )
        .await;
    assert_eq!(
        inherited.headers().get("access-control-allow-origin"),
        Some("https://api.example")
    );

    // The router-level origin no longer matches once the route replaces
    // the policy record.
    let replaced = app
        .handle(
            Request::builder(Method::Get, "/api/overridden")
                .header("Origin", "https://api.example")
                .build(),
        )
        .await;
    assert!(!replaced.headers().contains("access-control-allow-origin"));

    let special = app
        .handle(
            Request::builder(Method::Get, "/api/overridden")
                .header("Origin", "https://special.example")
                .build(),
        )
        .await;
    assert_eq!(
        special.headers().get("access-control-allow-origin"),
        Some("https://special.example")
    );
}

#[tokio::test]
async fn test_csp_nonce_header_and_handler_visibility() {
    let app = started(
        Application::builder()
            .csp(CspConfig::new().directive_sources(
                "script-src",
                vec![CspSource::token("self"), CspSource::Nonce],
            ))
            .route(
                Method::Get,
                "/page",
                Handler::from_fn("page", &["request"], |args| {
                    let request = args.get::<Request>("request")?;
                    let nonce = request
                        .extensions()
                        .get::<String>(CSP_NONCE_KEY)
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_default();
                    Ok(HandlerReturn::Value(json!({"nonce": nonce})))
                }),
            ),
    )
    .await;

    let response = app
        .handle(Request::builder(Method::Get, "/page").build())
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value =
        serde_json::from_slice(response.body().expect("body")).unwrap();
    let observed = body["nonce"].as_str().expect("handler saw the nonce");
    assert_eq!(observed.len(), 32);

    let header = response
        .headers()
        .get("content-security-policy")
        .expect("csp header");
    assert_eq!(header, &format!("script-src 'self' 'nonce-{}'", observed));
}

#[tokio::test]
async fn test_csp_report_only_and_auto_quoting() {
    let app = started(
        Application::builder()
            .csp(
                CspConfig::new()
                    .directive("default-src", ["none"])
                    .directive(
                        "script-src",
                        ["self", "unsafe-inline", "https://cdn.example"],
                    )
                    .report_only(true),
            )
            .route(Method::Get, "/page", ok_handler("page")),
    )
    .await;

    let response = app
        .handle(Request::builder(Method::Get, "/page").build())
        .await;

    assert!(!response.headers().contains("content-security-policy"));
    let header = response
        .headers()
        .get("content-security-policy-report-only")
        .expect("report-only header");
    assert_eq!(
        header,
        "default-src 'none'; script-src 'self' 'unsafe-inline' https://cdn.example"
    );
}

#[tokio::test]
async fn test_csp_provider_callback_overrides_policy() {
    use rusty_rest::provider::{provided, Provider, ProviderScope};

    let app = started(
        Application::builder()
            .csp(CspConfig::new().directive("script-src", ["self"]))
            .provider(Provider::from_fn(
                "csp",
                &[],
                ProviderScope::Request,
                |_| {
                    Ok(provided(
                        CspConfig::new().directive("script-src", ["none"]),
                    ))
                },
            ))
            .route(Method::Get, "/page", ok_handler("page")),
    )
    .await;

    let response = app
        .handle(Request::builder(Method::Get, "/page").build())
        .await;
    assert_eq!(
        response.headers().get("content-security-policy"),
        Some("script-src 'none'")
    );
}
