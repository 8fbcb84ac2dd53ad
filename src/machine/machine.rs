use std::sync::Arc;

use futures::FutureExt;

use super::outcome::{DecisionPoint, MachineTrace};
use crate::app::AppState;
use crate::conditional::{
    evaluate, format_http_date, parse_http_date, ConditionalOutcome, EntityTag, ResourceState,
};
use crate::cors::{is_preflight, CompiledCors};
use crate::csp::{compile as compile_csp, CompiledCsp, CspConfig};
use crate::dispatch::default_error_body;
use crate::error::{Result, WebError};
use crate::handler::HandlerReturn;
use crate::http::{Method, Request, Response};
use crate::metrics::RequestMetrics;
use crate::negotiate::{Renderer, RendererSet};
use crate::provider::{
    value_is_truthy, ProviderValue, RequestContext, Resolver, ScopedProviders,
};
use crate::router::{Route, RouteLookup};

/// The webmachine-style request engine: an ordered series of decision
/// points over the route table, the provider graph, the conditional
/// evaluator, and the content negotiator.
pub struct DecisionMachine {
    state: Arc<AppState>,
}

impl DecisionMachine {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn run(&self, request: Request) -> Response {
        self.run_traced(request).await.0
    }

    /// Run the machine and report which decision points were visited.
    pub async fn run_traced(&self, request: Request) -> (Response, MachineTrace) {
        let request = Arc::new(request);
        let metrics = Arc::new(RequestMetrics::new());

        tracing::debug!(
            request_id = %request.request_id(),
            method = %request.method(),
            path = %request.path(),
            "request received"
        );

        let state = self.state.as_ref();
        let mut run = MachineRun {
            state,
            resolver: Resolver::new(&state.registry, &state.app_cache),
            request: request.clone(),
            ctx: RequestContext::for_request(request.clone(), metrics.clone()),
            trace: MachineTrace::new(),
            route: None,
            decision_scoped: ScopedProviders::new(),
            handler_scoped: ScopedProviders::new(),
            resource: ResourceState::default(),
            renderer_set: RendererSet::new(),
            selected: None,
            compiled_csp: None,
            bypassed: false,
        };

        let outcome = run.execute().await;
        let mut response = match outcome {
            Ok(response) => response,
            Err(err) => run.error_response(err).await,
        };

        run.decorate(&mut response).await;
        run.ctx.run_teardowns().await;
        metrics.fold_into(&state.metrics, response.status());

        tracing::info!(
            request_id = %request.request_id(),
            method = %request.method(),
            path = %request.path(),
            status = response.status(),
            duration_ms = metrics.elapsed().as_millis() as u64,
            "request completed"
        );

        (response, run.trace)
    }
}

/// Per-request execution state.
struct MachineRun<'a> {
    state: &'a AppState,
    resolver: Resolver<'a>,
    request: Arc<Request>,
    ctx: RequestContext,
    trace: MachineTrace,
    route: Option<Arc<Route>>,
    /// Layers consulted for decision-point overrides: route decorator
    /// overrides, then route providers, then router providers.
    decision_scoped: ScopedProviders,
    /// Layers consulted for handler-parameter resolution; decorator
    /// overrides stay out of this chain.
    handler_scoped: ScopedProviders,
    resource: ResourceState,
    renderer_set: RendererSet,
    selected: Option<Renderer>,
    compiled_csp: Option<CompiledCsp>,
    bypassed: bool,
}

impl<'a> MachineRun<'a> {
    /// Walk the decision points. `Err` is a halt that flows into error
    /// dispatch; `Ok` carries the response, including the
    /// success-shaped `304` and synthesized `OPTIONS` responses.
    async fn execute(&mut self) -> Result<Response> {
        // 1: route_exists
        self.trace.visit(DecisionPoint::RouteExists);
        let route = match self
            .state
            .table
            .lookup(self.request.method(), self.request.path())
        {
            RouteLookup::Found { route, params } => {
                self.request.bind_path_params(params);
                self.install_scopes(&route);
                self.route = Some(route.clone());
                route
            }
            RouteLookup::MethodNotAllowed { allowed } => {
                if self.request.method() == Method::Options {
                    return self.options_response(&allowed);
                }
                return Err(WebError::MethodNotAllowed(method_names(&allowed)));
            }
            RouteLookup::NotFound => {
                return Err(WebError::NotFound(self.request.path().to_string()));
            }
        };

        // CSP compiles before handler execution so the nonce is visible
        // through the request extension map.
        if let Some(config) = self.effective_csp_config().await {
            self.compiled_csp = Some(compile_csp(&config, &self.request));
        }

        if route.bypasses_state_machine() {
            self.bypassed = true;
            return self.bypass_invoke(&route).await;
        }

        // 2: service_available
        self.trace.visit(DecisionPoint::ServiceAvailable);
        if let Some(value) = self.decision_value("service_available").await? {
            if !value_is_truthy(&value) {
                return Err(WebError::Unavailable(
                    "service_available reported unavailable".to_string(),
                ));
            }
        }

        // 3: known_method
        self.trace.visit(DecisionPoint::KnownMethod);
        let known = match self.decision_value("known_method").await? {
            Some(value) => value_is_truthy(&value),
            None => self.request.method().is_known(),
        };
        if !known {
            return Err(WebError::UnsupportedMethod(
                self.request.method().as_str().to_string(),
            ));
        }

        // 4: uri_too_long
        self.trace.visit(DecisionPoint::UriTooLong);
        let too_long = match self.decision_value("uri_too_long").await? {
            Some(value) => value_is_truthy(&value),
            None => self.request.path().len() > self.state.config.max_uri_length,
        };
        if too_long {
            return Err(WebError::UriTooLong(self.request.path().len()));
        }

        // 5: method_allowed
        self.trace.visit(DecisionPoint::MethodAllowed);
        let allowed = match self.decision_value("method_allowed").await? {
            Some(value) => value_is_truthy(&value),
            // The table already matched the method for this route.
            None => true,
        };
        if !allowed {
            let allow = self.state.table.allowed_methods(self.request.path());
            return Err(WebError::MethodNotAllowed(method_names(&allow)));
        }

        // 6: malformed_request
        self.trace.visit(DecisionPoint::MalformedRequest);
        match self.decision_value("malformed_request").await? {
            Some(value) => {
                if value_is_truthy(&value) {
                    return Err(WebError::BadRequest(
                        "malformed_request predicate rejected the body".to_string(),
                    ));
                }
            }
            None => {
                if let Some(err) = self.body_malformation() {
                    return Err(err);
                }
            }
        }

        // 7: authorized
        self.trace.visit(DecisionPoint::Authorized);
        if let Some(value) = self.decision_value("authorized").await? {
            if !value_is_truthy(&value) {
                return Err(WebError::Unauthorized(
                    "authorization predicate rejected the request".to_string(),
                ));
            }
        }

        // 8: forbidden
        self.trace.visit(DecisionPoint::Forbidden);
        if let Some(value) = self.decision_value("forbidden").await? {
            if value_is_truthy(&value) {
                return Err(WebError::Forbidden(
                    "access to the resource is forbidden".to_string(),
                ));
            }
        }

        // 9: content_headers_valid
        self.trace.visit(DecisionPoint::ContentHeadersValid);
        match self.decision_value("content_headers_valid").await? {
            Some(value) => {
                if !value_is_truthy(&value) {
                    return Err(WebError::BadRequest(
                        "content headers failed validation".to_string(),
                    ));
                }
            }
            None => {
                if let Some(err) = self.invalid_content_headers() {
                    return Err(err);
                }
            }
        }

        // 10: resource_exists
        self.trace.visit(DecisionPoint::ResourceExists);
        match self.decision_value("resource_exists").await? {
            Some(value) => {
                let exists = value_is_truthy(&value);
                self.resource.exists = exists;
                // POST against a missing resource proceeds to create.
                if !exists && self.request.method() != Method::Post {
                    return Err(WebError::NotFound(format!(
                        "resource missing for path: {}",
                        self.request.path()
                    )));
                }
            }
            None => {
                self.resource.exists = true;
            }
        }

        // 11: conditional checks
        self.trace.visit(DecisionPoint::Conditional);
        self.load_resource_validators().await?;
        match evaluate(&self.request, &self.resource) {
            ConditionalOutcome::Proceed => {}
            ConditionalOutcome::NotModified => return Ok(self.not_modified_response()),
            ConditionalOutcome::PreconditionFailed => {
                return Err(WebError::PreconditionFailed(
                    "request preconditions failed against current resource state".to_string(),
                ));
            }
        }

        // 12: content_types_provided
        self.trace.visit(DecisionPoint::ContentTypesProvided);
        self.renderer_set = RendererSet::compose(
            &[
                route.overrides().renderers.as_slice(),
                route.router_layer().renderers.as_slice(),
                self.state.global_renderers.as_slice(),
            ],
            self.state.config.implicit_json_fallback,
        );
        if self.renderer_set.is_empty() {
            return Err(WebError::Internal(format!(
                "no renderers available for route: {}",
                route.template().raw()
            )));
        }

        // 13: content_types_accepted
        self.trace.visit(DecisionPoint::ContentTypesAccepted);
        let accept = self.request.headers().get("accept").map(str::to_string);
        let selected = self.renderer_set.select(accept.as_deref()).cloned();
        match selected {
            Some(renderer) => self.selected = Some(renderer),
            None => {
                return Err(WebError::NotAcceptable(
                    accept.unwrap_or_else(|| "*/*".to_string()),
                ));
            }
        }

        // 14: execute_and_render
        self.trace.visit(DecisionPoint::ExecuteAndRender);
        self.invoke_handler(&route).await
    }

    fn install_scopes(&mut self, route: &Arc<Route>) {
        let route_providers = Arc::new(route.overrides().providers.clone());
        let router_providers = Arc::new(route.router_layer().providers.clone());

        let mut decision = ScopedProviders::new();
        decision.push_layer(Arc::new(route.overrides().decision_overrides.clone()));
        decision.push_layer(route_providers.clone());
        decision.push_layer(router_providers.clone());
        self.decision_scoped = decision;

        let mut handler = ScopedProviders::new();
        handler.push_layer(route_providers);
        handler.push_layer(router_providers);
        self.handler_scoped = handler;
    }

    /// Resolve a decision-point override if one is registered anywhere
    /// in the scope chain; `None` means the default applies.
    async fn decision_value(&mut self, name: &str) -> Result<Option<ProviderValue>> {
        let registered = self.decision_scoped.lookup(name).is_some()
            || self.state.registry.contains(name);
        if !registered {
            return Ok(None);
        }
        let scoped = self.decision_scoped.clone();
        self.resolver
            .resolve(name, &scoped, &mut self.ctx)
            .await
            .map(Some)
    }

    /// Default malformed_request check: a present body must decode
    /// under its declared content type.
    fn body_malformation(&self) -> Option<WebError> {
        if !self.request.has_body() {
            return None;
        }
        match self.request.content_type().as_deref() {
            Some("application/json") | None => self.request.json_body().err(),
            Some(media) if media.ends_with("+json") => self.request.json_body().err(),
            Some("application/x-www-form-urlencoded") => self.request.form_body().err(),
            Some(_) => None,
        }
    }

    /// Default content_headers_valid check: declared content headers
    /// must be well-formed.
    fn invalid_content_headers(&self) -> Option<WebError> {
        if let Some(length) = self.request.headers().get("content-length") {
            if length.trim().parse::<u64>().is_err() {
                return Some(WebError::BadRequest(format!(
                    "invalid Content-Length header: {}",
                    length
                )));
            }
        }
        if let Some(content_type) = self.request.headers().get("content-type") {
            let essence = content_type.split(';').next().unwrap_or("").trim();
            if crate::negotiate::MediaType::parse(essence).is_none() {
                return Some(WebError::BadRequest(format!(
                    "invalid Content-Type header: {}",
                    content_type
                )));
            }
        }
        None
    }

    /// Resolve the dedicated validator providers after resource_exists
    /// succeeded.
    async fn load_resource_validators(&mut self) -> Result<()> {
        if let Some(value) = self.decision_value("etag").await? {
            self.resource.etag = extract_etag(&value);
        }
        if let Some(value) = self.decision_value("last_modified").await? {
            self.resource.last_modified = extract_last_modified(&value);
        }
        Ok(())
    }

    async fn invoke_handler(&mut self, route: &Arc<Route>) -> Result<Response> {
        let handler = route.handler().clone();
        let scoped = self.handler_scoped.clone();
        let args = self
            .resolver
            .resolve_args(handler.params(), &scoped, &mut self.ctx)
            .await?;

        self.ctx.metrics.increment("handler_invocations");
        let invoked = std::panic::AssertUnwindSafe(handler.invoke(args))
            .catch_unwind()
            .await;
        let returned = match invoked {
            Ok(result) => result?,
            Err(_) => {
                return Err(WebError::Internal(format!(
                    "handler panicked: {}",
                    handler.name()
                )));
            }
        };

        self.check_outbound(route, &returned)?;

        let mut response = match returned {
            HandlerReturn::NoContent => Response::new(204),
            HandlerReturn::Value(value) => self.render(value, 200, &[]).await?,
            HandlerReturn::ValueStatus(value, status) => {
                self.render(value, status, &[]).await?
            }
            HandlerReturn::ValueStatusHeaders(value, status, headers) => {
                self.render(value, status, &headers).await?
            }
            HandlerReturn::Response(response) => response,
        };

        // Computed validators decorate any success the handler did not
        // already stamp.
        if let Some(etag) = &self.resource.etag {
            response
                .headers_mut()
                .set_if_absent("etag", etag.to_string());
        }
        if let Some(modified) = self.resource.last_modified {
            response
                .headers_mut()
                .set_if_absent("last-modified", format_http_date(modified));
        }

        Ok(response)
    }

    /// Outbound shape check: a declared return type with a registered
    /// validator must round-trip; a mismatch is a server invariant
    /// violation.
    fn check_outbound(&self, route: &Arc<Route>, returned: &HandlerReturn) -> Result<()> {
        let target = match route.handler().return_type() {
            Some(target) => target,
            None => return Ok(()),
        };
        let validator = match self.state.registry.validator_for_target(target) {
            Some(validator) => validator,
            None => return Ok(()),
        };
        let check = match validator.outbound_check() {
            Some(check) => check,
            None => return Ok(()),
        };
        let value = match returned {
            HandlerReturn::Value(value)
            | HandlerReturn::ValueStatus(value, _)
            | HandlerReturn::ValueStatusHeaders(value, _, _) => value,
            _ => return Ok(()),
        };
        check(value)
    }

    async fn render(
        &mut self,
        value: serde_json::Value,
        status: u16,
        extra_headers: &[(String, String)],
    ) -> Result<Response> {
        let renderer = self.selected.clone().ok_or_else(|| {
            WebError::Internal("no renderer selected before render".to_string())
        })?;
        let body = renderer.render(value, self.request.clone()).await?;
        let mut response = Response::new(status)
            .with_content_type(renderer.media_type().essence())
            .with_body(body);
        for (name, value) in extra_headers {
            response.headers_mut().append(name, value.clone());
        }
        Ok(response)
    }

    /// Bypass path: route_exists ran, everything else is skipped and
    /// the handler's return emits verbatim.
    async fn bypass_invoke(&mut self, route: &Arc<Route>) -> Result<Response> {
        let handler = route.handler().clone();
        let scoped = self.handler_scoped.clone();
        let args = self
            .resolver
            .resolve_args(handler.params(), &scoped, &mut self.ctx)
            .await?;

        let response = match handler.invoke(args).await? {
            HandlerReturn::NoContent => Response::new(204),
            HandlerReturn::Response(response) => response,
            HandlerReturn::Value(value) => render_json_verbatim(value, 200)?,
            HandlerReturn::ValueStatus(value, status) => render_json_verbatim(value, status)?,
            HandlerReturn::ValueStatusHeaders(value, status, headers) => {
                let mut response = render_json_verbatim(value, status)?;
                for (name, value) in headers {
                    response.headers_mut().append(&name, value);
                }
                response
            }
        };
        Ok(response)
    }

    /// `OPTIONS` against a path with no explicit `OPTIONS` route: a
    /// matching preflight synthesizes CORS headers; anything else gets
    /// the route's own `Allow` set.
    fn options_response(&mut self, allowed: &[Method]) -> Result<Response> {
        if is_preflight(&self.request) {
            if let Some(config) = self.state.cors_for_path(self.request.path()) {
                let compiled = CompiledCors::new(config);
                let detected = self.state.table.allowed_methods(self.request.path());
                if let Some(response) =
                    compiled.preflight_response(&self.request, &detected)
                {
                    return Ok(response);
                }
            }
        }
        let mut response = Response::new(204);
        response
            .headers_mut()
            .append("allow", method_names(allowed).join(", "));
        Ok(response)
    }

    fn not_modified_response(&self) -> Response {
        let mut response = Response::new(304);
        if let Some(etag) = &self.resource.etag {
            response.headers_mut().append("etag", etag.to_string());
        }
        if let Some(modified) = self.resource.last_modified {
            response
                .headers_mut()
                .append("last-modified", format_http_date(modified));
        }
        response
    }

    /// Build the error response through dispatch and negotiation.
    async fn error_response(&mut self, err: WebError) -> Response {
        let status = err.status_code();
        if status >= 500 {
            tracing::error!(
                request_id = %self.request.request_id(),
                error = %err,
                "request failed with internal error"
            );
        } else {
            tracing::debug!(
                request_id = %self.request.request_id(),
                status,
                error = %err,
                "request halted"
            );
        }

        let set = if self.renderer_set.is_empty() {
            RendererSet::compose(&[self.state.global_renderers.as_slice()], true)
        } else {
            self.renderer_set.clone()
        };
        let accept = self.request.headers().get("accept").map(str::to_string);
        let chosen = match &self.selected {
            Some(renderer) => Some(renderer.clone()),
            None => set.select(accept.as_deref()).cloned(),
        };
        let media = chosen.as_ref().map(|renderer| renderer.media_type().clone());

        let message = err.client_message();
        let mut rendered: Option<(serde_json::Value, u16, Vec<(String, String)>)> = None;
        let mut direct: Option<Response> = None;

        if let Some(handler) = self.state.error_dispatcher.lookup(status, media.as_ref()) {
            let invoked = std::panic::AssertUnwindSafe(handler(
                self.request.clone(),
                message.clone(),
            ))
            .catch_unwind()
            .await;
            match invoked {
                Ok(Ok(HandlerReturn::Response(response))) => direct = Some(response),
                Ok(Ok(HandlerReturn::NoContent)) => direct = Some(Response::new(status)),
                Ok(Ok(HandlerReturn::Value(value))) => {
                    rendered = Some((value, status, Vec::new()))
                }
                Ok(Ok(HandlerReturn::ValueStatus(value, code))) => {
                    rendered = Some((value, code, Vec::new()))
                }
                Ok(Ok(HandlerReturn::ValueStatusHeaders(value, code, headers))) => {
                    rendered = Some((value, code, headers))
                }
                Ok(Err(handler_err)) => {
                    tracing::error!(
                        error = %handler_err,
                        status,
                        "registered error handler failed; using default body"
                    );
                }
                Err(_) => {
                    tracing::error!(status, "registered error handler panicked");
                }
            }
        }

        let mut response = match direct {
            Some(response) => response,
            None => {
                let (value, code, extra_headers) = rendered.unwrap_or_else(|| {
                    let mut body = default_error_body(status, &message);
                    if let Some(fields) = err.field_errors() {
                        if let Ok(details) = serde_json::to_value(fields) {
                            body["details"] = details;
                        }
                    }
                    (body, status, Vec::new())
                });
                self.render_error_body(chosen, value, code, extra_headers, &message)
                    .await
            }
        };

        if let WebError::MethodNotAllowed(allowed) = &err {
            response.headers_mut().set("allow", allowed.join(", "));
        }

        response
    }

    /// Render the error body through the negotiated renderer, falling
    /// back to `text/plain` when negotiation or rendering fails.
    async fn render_error_body(
        &self,
        chosen: Option<Renderer>,
        value: serde_json::Value,
        status: u16,
        extra_headers: Vec<(String, String)>,
        message: &str,
    ) -> Response {
        let rendered = match &chosen {
            Some(renderer) => renderer
                .render(value, self.request.clone())
                .await
                .ok()
                .map(|body| (renderer.media_type().essence(), body)),
            None => None,
        };

        let mut response = match rendered {
            Some((content_type, body)) => Response::new(status)
                .with_content_type(content_type)
                .with_body(body),
            None => Response::new(status)
                .with_content_type("text/plain")
                .with_body(message.as_bytes().to_vec()),
        };
        for (name, value) in extra_headers {
            response.headers_mut().append(&name, value);
        }
        response
    }

    /// Effective CSP: a registered `csp` provider callback outranks the
    /// route/router/app policy records.
    async fn effective_csp_config(&mut self) -> Option<CspConfig> {
        let registered = self.decision_scoped.lookup("csp").is_some()
            || self.state.registry.contains("csp");
        if registered {
            let scoped = self.decision_scoped.clone();
            match self.resolver.resolve("csp", &scoped, &mut self.ctx).await {
                Ok(value) => match value.downcast::<CspConfig>() {
                    Ok(config) => return Some((*config).clone()),
                    Err(_) => {
                        tracing::warn!(
                            "csp provider produced a non-CspConfig value; ignoring"
                        );
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "csp provider failed; ignoring");
                }
            }
        }
        self.route
            .as_ref()
            .and_then(|route| route.effective_csp(self.state.csp.as_ref()).cloned())
    }

    /// Response decoration: CORS, CSP, request id, HEAD body
    /// suppression. Bypass routes emit verbatim and skip all of it.
    async fn decorate(&mut self, response: &mut Response) {
        if self.bypassed {
            return;
        }

        let cors_config = match &self.route {
            Some(route) => route.effective_cors(self.state.cors.as_ref()).cloned(),
            None => self.state.cors_for_path(self.request.path()),
        };
        if let Some(config) = cors_config {
            CompiledCors::new(config).decorate(&self.request, response);
        }

        let compiled_csp = match self.compiled_csp.take() {
            Some(compiled) => Some(compiled),
            None => self
                .state
                .csp_for_path(self.request.path())
                .map(|config| compile_csp(&config, &self.request)),
        };
        if let Some(compiled) = compiled_csp {
            response
                .headers_mut()
                .set_if_absent(compiled.header_name, compiled.header_value);
        }

        if self.state.config.emit_request_id {
            response
                .headers_mut()
                .set_if_absent("x-request-id", self.request.request_id());
        }

        if self.request.method() == Method::Head {
            let _ = response.take_body();
        }
    }
}

fn method_names(methods: &[Method]) -> Vec<String> {
    methods.iter().map(|m| m.as_str().to_string()).collect()
}

fn render_json_verbatim(value: serde_json::Value, status: u16) -> Result<Response> {
    let body = serde_json::to_vec(&value)?;
    Ok(Response::new(status)
        .with_content_type("application/json")
        .with_body(body))
}

/// Coerce a provider value into an entity tag: native `EntityTag`,
/// `String`, or JSON string.
fn extract_etag(value: &ProviderValue) -> Option<EntityTag> {
    if let Some(tag) = value.downcast_ref::<EntityTag>() {
        return Some(tag.clone());
    }
    if let Some(raw) = value.downcast_ref::<String>() {
        return EntityTag::parse(raw);
    }
    if let Some(json) = value.downcast_ref::<serde_json::Value>() {
        if let Some(raw) = json.as_str() {
            return EntityTag::parse(raw);
        }
    }
    None
}

/// Coerce a provider value into a Last-Modified timestamp: native
/// `DateTime<Utc>`, an HTTP-date string, or a JSON string.
fn extract_last_modified(value: &ProviderValue) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Some(when) = value.downcast_ref::<chrono::DateTime<chrono::Utc>>() {
        return Some(*when);
    }
    if let Some(raw) = value.downcast_ref::<String>() {
        return parse_http_date(raw);
    }
    if let Some(json) = value.downcast_ref::<serde_json::Value>() {
        if let Some(raw) = json.as_str() {
            return parse_http_date(raw);
        }
    }
    None
}

// Integration-grade coverage for the machine lives in tests/; the
// helpers here get focused unit tests.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::provided;
    use serde_json::json;

    #[test]
    fn test_extract_etag_coercions() {
        assert_eq!(
            extract_etag(&provided(EntityTag::strong("v1"))).unwrap(),
            EntityTag::strong("v1")
        );
        assert_eq!(
            extract_etag(&provided("\"v1\"".to_string())).unwrap(),
            EntityTag::strong("v1")
        );
        assert_eq!(
            extract_etag(&provided(json!("W/\"v2\""))).unwrap(),
            EntityTag::weak("v2")
        );
        assert!(extract_etag(&provided(42u64)).is_none());
    }

    #[test]
    fn test_extract_last_modified_coercions() {
        let native = chrono::Utc::now();
        assert_eq!(extract_last_modified(&provided(native)), Some(native));

        let parsed =
            extract_last_modified(&provided("Sun, 06 Nov 1994 08:49:37 GMT".to_string()));
        assert!(parsed.is_some());

        assert!(extract_last_modified(&provided(json!("not a date"))).is_none());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(
            method_names(&[Method::Get, Method::Options]),
            vec!["GET".to_string(), "OPTIONS".to_string()]
        );
    }

    #[test]
    fn test_render_json_verbatim() {
        let response = render_json_verbatim(json!({"ok": true}), 201).unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(response.content_type(), Some("application/json"));
    }
}
