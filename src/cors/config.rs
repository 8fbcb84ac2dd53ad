use serde::{Deserialize, Serialize};

use crate::error::{Result, WebError};
use crate::http::Method;

/// Which origins a policy admits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginPolicy {
    /// Exact `*`; incompatible with credentials unless reflection is
    /// explicitly enabled for development.
    Any,
    /// Explicit whitelist; entries may carry `*.` subdomain wildcards.
    List(Vec<String>),
    /// Reflect whatever origin the request carries.
    Reflect,
}

/// Immutable CORS policy record. Composes app → router → route; a more
/// specific level replaces the whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins.
    pub origins: OriginPolicy,
    /// Allowed methods; `None` auto-detects from the route table per
    /// path at preflight time.
    pub allow_methods: Option<Vec<Method>>,
    /// Request headers admitted on preflight.
    pub allow_headers: Vec<String>,
    /// Response headers exposed to the caller.
    pub expose_headers: Vec<String>,
    /// Whether credentialed requests are admitted.
    pub credentials: bool,
    /// Preflight cache lifetime in seconds.
    pub max_age: Option<u64>,
    /// Development-only escape hatch pairing origin reflection with
    /// credentials.
    pub reflect_any_origin: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: OriginPolicy::List(Vec::new()),
            allow_methods: None,
            allow_headers: Vec::new(),
            expose_headers: Vec::new(),
            credentials: false,
            max_age: None,
            reflect_any_origin: false,
        }
    }
}

impl CorsConfig {
    pub fn new(origins: OriginPolicy) -> Self {
        Self {
            origins,
            ..Self::default()
        }
    }

    pub fn allow_origins<S: Into<String>>(origins: impl IntoIterator<Item = S>) -> Self {
        Self::new(OriginPolicy::List(
            origins.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn any_origin() -> Self {
        Self::new(OriginPolicy::Any)
    }

    pub fn reflect_origin() -> Self {
        Self::new(OriginPolicy::Reflect)
    }

    pub fn with_credentials(mut self, credentials: bool) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allow_methods = Some(methods.into_iter().collect());
        self
    }

    pub fn with_allow_headers<S: Into<String>>(
        mut self,
        headers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allow_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expose_headers<S: Into<String>>(
        mut self,
        headers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.expose_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_reflect_any_origin(mut self, enabled: bool) -> Self {
        self.reflect_any_origin = enabled;
        self
    }

    /// Registration-time validation: wildcard origins cannot pair with
    /// credentials, which the Fetch Standard forbids, unless the
    /// development-only reflection flag is set.
    pub fn validate(&self) -> Result<()> {
        if self.origins == OriginPolicy::Any && self.credentials && !self.reflect_any_origin {
            return Err(WebError::Configuration(
                "CORS: origins=* cannot be combined with credentials=true \
                 (set reflect_any_origin for development use)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_plus_credentials_rejected() {
        let config = CorsConfig::any_origin().with_credentials(true);
        assert!(matches!(
            config.validate(),
            Err(WebError::Configuration(_))
        ));
    }

    #[test]
    fn test_reflect_any_origin_escape_hatch() {
        let config = CorsConfig::any_origin()
            .with_credentials(true)
            .with_reflect_any_origin(true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_list_with_credentials_allowed() {
        let config =
            CorsConfig::allow_origins(["https://app.example"]).with_credentials(true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = CorsConfig::allow_origins(["https://app.example"])
            .with_methods([Method::Get, Method::Post])
            .with_allow_headers(["content-type"])
            .with_expose_headers(["x-request-id"])
            .with_max_age(600);

        assert_eq!(config.allow_methods.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.max_age, Some(600));
    }
}
