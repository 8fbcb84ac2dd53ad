use std::sync::Arc;

use crate::http::Request;

/// One source token in a directive's source list.
#[derive(Clone)]
pub enum CspSource {
    /// A keyword, scheme, host, hash, or pre-quoted token. Keywords
    /// auto-quote on emission.
    Token(String),
    /// Pseudo-source requesting a fresh per-request nonce.
    Nonce,
    /// Evaluated per request; useful for tokens that depend on request
    /// state (tenant CDN hosts and the like).
    Callable(Arc<dyn Fn(&Request) -> String + Send + Sync>),
}

impl CspSource {
    pub fn token(value: impl Into<String>) -> Self {
        CspSource::Token(value.into())
    }

    pub fn callable<F>(func: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        CspSource::Callable(Arc::new(func))
    }
}

impl std::fmt::Debug for CspSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CspSource::Token(token) => f.debug_tuple("Token").field(token).finish(),
            CspSource::Nonce => f.write_str("Nonce"),
            CspSource::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

impl From<&str> for CspSource {
    fn from(value: &str) -> Self {
        CspSource::Token(value.to_string())
    }
}

impl From<String> for CspSource {
    fn from(value: String) -> Self {
        CspSource::Token(value)
    }
}

/// Immutable CSP policy record: directives in registration order, each
/// with its source list.
#[derive(Debug, Clone, Default)]
pub struct CspConfig {
    directives: Vec<(String, Vec<CspSource>)>,
    report_only: bool,
}

impl CspConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directive. Registration order is emission order.
    pub fn directive<S: Into<CspSource>>(
        mut self,
        name: impl Into<String>,
        sources: impl IntoIterator<Item = S>,
    ) -> Self {
        self.directives.push((
            name.into(),
            sources.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn directive_sources(
        mut self,
        name: impl Into<String>,
        sources: Vec<CspSource>,
    ) -> Self {
        self.directives.push((name.into(), sources));
        self
    }

    pub fn report_only(mut self, enabled: bool) -> Self {
        self.report_only = enabled;
        self
    }

    pub fn is_report_only(&self) -> bool {
        self.report_only
    }

    pub fn directives(&self) -> &[(String, Vec<CspSource>)] {
        &self.directives
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Whether any directive requests a per-request nonce.
    pub fn wants_nonce(&self) -> bool {
        self.directives
            .iter()
            .any(|(_, sources)| sources.iter().any(|s| matches!(s, CspSource::Nonce)))
    }
}
