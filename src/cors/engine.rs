use super::config::{CorsConfig, OriginPolicy};
use super::matcher::OriginMatcher;
use crate::http::{Method, Request, Response};

/// A CORS policy compiled for request-time evaluation: the origin
/// allow-list parses once, at finalize.
#[derive(Debug, Clone)]
pub struct CompiledCors {
    config: CorsConfig,
    matcher: OriginMatcher,
}

impl CompiledCors {
    pub fn new(config: CorsConfig) -> Self {
        let matcher = match &config.origins {
            OriginPolicy::List(origins) => OriginMatcher::from_origins(origins),
            _ => OriginMatcher::new(),
        };
        Self { config, matcher }
    }

    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    /// The `Access-Control-Allow-Origin` value for a request origin, or
    /// `None` when the origin is not admitted.
    pub fn origin_value(&self, origin: &str) -> Option<String> {
        match &self.config.origins {
            OriginPolicy::Any => {
                if self.config.credentials && self.config.reflect_any_origin {
                    Some(origin.to_string())
                } else {
                    Some("*".to_string())
                }
            }
            OriginPolicy::Reflect => Some(origin.to_string()),
            OriginPolicy::List(_) => {
                if self.matcher.is_allowed(origin) {
                    Some(origin.to_string())
                } else {
                    None
                }
            }
        }
    }

    /// Whether origin matching depends on the request origin; drives
    /// `Vary: Origin` emission.
    fn origin_matching_is_nontrivial(&self) -> bool {
        !matches!(&self.config.origins, OriginPolicy::Any)
            || (self.config.credentials && self.config.reflect_any_origin)
    }

    /// Synthesize the preflight response. Returns `None` when the
    /// request origin does not match; the request then proceeds without
    /// CORS headers and the browser enforces the block.
    pub fn preflight_response(
        &self,
        request: &Request,
        detected_methods: &[Method],
    ) -> Option<Response> {
        let origin = request.headers().get("origin")?;
        let allow_origin = self.origin_value(origin)?;

        let mut response = Response::new(204);
        response
            .headers_mut()
            .append("access-control-allow-origin", allow_origin);
        response.headers_mut().append(
            "access-control-allow-methods",
            self.allow_methods_value(detected_methods),
        );

        let allow_headers = self.allow_headers_value(request);
        if !allow_headers.is_empty() {
            response
                .headers_mut()
                .append("access-control-allow-headers", allow_headers);
        }

        if let Some(max_age) = self.config.max_age {
            response
                .headers_mut()
                .append("access-control-max-age", max_age.to_string());
        }

        if self.config.credentials {
            response
                .headers_mut()
                .append("access-control-allow-credentials", "true");
        }

        response.headers_mut().merge_list_value("vary", "Origin");
        Some(response)
    }

    /// Decorate an actual (non-preflight) response for a matched origin.
    pub fn decorate(&self, request: &Request, response: &mut Response) {
        let origin = match request.headers().get("origin") {
            Some(origin) => origin,
            None => return,
        };
        let allow_origin = match self.origin_value(origin) {
            Some(value) => value,
            None => return,
        };

        response
            .headers_mut()
            .set_if_absent("access-control-allow-origin", allow_origin);

        if self.config.credentials {
            response
                .headers_mut()
                .set_if_absent("access-control-allow-credentials", "true");
        }

        if !self.config.expose_headers.is_empty() {
            response.headers_mut().set_if_absent(
                "access-control-expose-headers",
                self.config.expose_headers.join(", "),
            );
        }

        if self.origin_matching_is_nontrivial() {
            response.headers_mut().merge_list_value("vary", "Origin");
        }
    }

    /// `Access-Control-Allow-Methods`: the configured set, or the
    /// auto-detected set for the path, always including `OPTIONS`,
    /// alphabetical.
    fn allow_methods_value(&self, detected: &[Method]) -> String {
        let mut methods: Vec<Method> = match &self.config.allow_methods {
            Some(configured) => configured.clone(),
            None => detected.to_vec(),
        };
        if !methods.contains(&Method::Options) {
            methods.push(Method::Options);
        }
        let mut names: Vec<&str> = methods.iter().map(Method::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names.join(", ")
    }

    /// Configured allow-list, or a reflection of the requested headers
    /// when nothing was configured.
    fn allow_headers_value(&self, request: &Request) -> String {
        if !self.config.allow_headers.is_empty() {
            return self.config.allow_headers.join(", ");
        }
        request
            .headers()
            .get("access-control-request-headers")
            .unwrap_or("")
            .to_string()
    }
}

/// A CORS preflight: `OPTIONS` carrying an origin and the probe method.
pub fn is_preflight(request: &Request) -> bool {
    request.method() == Method::Options
        && request.headers().contains("origin")
        && request
            .headers()
            .contains("access-control-request-method")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::config::CorsConfig;

    fn preflight_request(origin: &str) -> Request {
        Request::builder(Method::Options, "/api/x")
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .build()
    }

    fn policy(origins: &[&str], credentials: bool) -> CompiledCors {
        CompiledCors::new(
            CorsConfig::allow_origins(origins.iter().copied()).with_credentials(credentials),
        )
    }

    #[test]
    fn test_is_preflight() {
        assert!(is_preflight(&preflight_request("https://app.example")));

        let plain_options = Request::builder(Method::Options, "/api/x")
            .header("Origin", "https://app.example")
            .build();
        assert!(!is_preflight(&plain_options));

        let not_options = Request::builder(Method::Get, "/api/x")
            .header("Origin", "https://app.example")
            .header("Access-Control-Request-Method", "POST")
            .build();
        assert!(!is_preflight(&not_options));
    }

    #[test]
    fn test_preflight_matched_origin() {
        let cors = policy(&["https://app.example"], true);
        let response = cors
            .preflight_response(&preflight_request("https://app.example"), &[Method::Post])
            .unwrap();

        assert_eq!(response.status(), 204);
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin"),
            Some("https://app.example")
        );
        assert_eq!(headers.get("access-control-allow-credentials"), Some("true"));
        assert_eq!(
            headers.get("access-control-allow-methods"),
            Some("OPTIONS, POST")
        );
        assert_eq!(headers.get("vary"), Some("Origin"));
    }

    #[test]
    fn test_preflight_unmatched_origin_is_none() {
        let cors = policy(&["https://app.example"], false);
        assert!(cors
            .preflight_response(&preflight_request("https://evil.example"), &[Method::Post])
            .is_none());
    }

    #[test]
    fn test_any_origin_emits_star() {
        let cors = CompiledCors::new(CorsConfig::any_origin());
        let response = cors
            .preflight_response(&preflight_request("https://anyone.example"), &[Method::Get])
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some("*")
        );
    }

    #[test]
    fn test_reflect_any_origin_reflects_with_credentials() {
        let cors = CompiledCors::new(
            CorsConfig::any_origin()
                .with_credentials(true)
                .with_reflect_any_origin(true),
        );
        let response = cors
            .preflight_response(&preflight_request("https://dev.example"), &[Method::Get])
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some("https://dev.example")
        );
    }

    #[test]
    fn test_decorate_actual_response() {
        let cors = policy(&["https://app.example"], true);
        let request = Request::builder(Method::Get, "/api/x")
            .header("Origin", "https://app.example")
            .build();
        let mut response = Response::new(200);
        cors.decorate(&request, &mut response);

        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin"),
            Some("https://app.example")
        );
        assert_eq!(headers.get("access-control-allow-credentials"), Some("true"));
        assert_eq!(headers.get("vary"), Some("Origin"));
    }

    #[test]
    fn test_decorate_skips_unmatched_origin() {
        let cors = policy(&["https://app.example"], false);
        let request = Request::builder(Method::Get, "/api/x")
            .header("Origin", "https://evil.example")
            .build();
        let mut response = Response::new(200);
        cors.decorate(&request, &mut response);

        assert!(!response.headers().contains("access-control-allow-origin"));
        assert!(!response.headers().contains("vary"));
    }

    #[test]
    fn test_decorate_expose_headers() {
        let cors = CompiledCors::new(
            CorsConfig::allow_origins(["https://app.example"])
                .with_expose_headers(["x-request-id", "etag"]),
        );
        let request = Request::builder(Method::Get, "/api/x")
            .header("Origin", "https://app.example")
            .build();
        let mut response = Response::new(200);
        cors.decorate(&request, &mut response);

        assert_eq!(
            response.headers().get("access-control-expose-headers"),
            Some("x-request-id, etag")
        );
    }

    #[test]
    fn test_allow_headers_reflects_when_unconfigured() {
        let cors = policy(&["https://app.example"], false);
        let request = Request::builder(Method::Options, "/api/x")
            .header("Origin", "https://app.example")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "x-custom, content-type")
            .build();
        let response = cors.preflight_response(&request, &[Method::Post]).unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-headers"),
            Some("x-custom, content-type")
        );
    }

    #[test]
    fn test_configured_methods_override_detection() {
        let cors = CompiledCors::new(
            CorsConfig::allow_origins(["https://app.example"]).with_methods([Method::Put]),
        );
        let response = cors
            .preflight_response(
                &preflight_request("https://app.example"),
                &[Method::Get, Method::Post],
            )
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-methods"),
            Some("OPTIONS, PUT")
        );
    }
}
