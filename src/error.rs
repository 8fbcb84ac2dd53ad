use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field-level validation failures, keyed by field name.
///
/// Kept ordered so diagnostic output and rendered error bodies are stable
/// across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Error, Debug)]
pub enum WebError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed; allowed: {}", .0.join(", "))]
    MethodNotAllowed(Vec<String>),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("No acceptable representation: {0}")]
    NotAcceptable(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Not modified")]
    NotModified,

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Request URI too long: {0} bytes")]
    UriTooLong(usize),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Registration error: {0}")]
    Registration(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WebError {
    /// HTTP status code this error maps to when it halts the decision
    /// machine. Startup-time kinds that leak into a request path report
    /// as internal errors.
    pub fn status_code(&self) -> u16 {
        match self {
            WebError::NotFound(_) => 404,
            WebError::MethodNotAllowed(_) => 405,
            WebError::Unauthorized(_) => 401,
            WebError::Forbidden(_) => 403,
            WebError::BadRequest(_) => 400,
            WebError::Validation(_) => 400,
            WebError::NotAcceptable(_) => 406,
            WebError::PreconditionFailed(_) => 412,
            WebError::NotModified => 304,
            WebError::UnsupportedMethod(_) => 501,
            WebError::Unavailable(_) => 503,
            WebError::UriTooLong(_) => 414,
            WebError::Internal(_)
            | WebError::Configuration(_)
            | WebError::Registration(_)
            | WebError::Provider(_)
            | WebError::Render(_)
            | WebError::Serialization(_) => 500,
        }
    }

    /// Whether the mapped status is a success-shaped halt (304) rather
    /// than a failure.
    pub fn is_success_halt(&self) -> bool {
        matches!(self, WebError::NotModified)
    }

    /// Message safe to echo to the client. Internal causes are replaced
    /// with the bare phrase; the full cause stays in the log.
    pub fn client_message(&self) -> String {
        match self {
            WebError::Internal(_)
            | WebError::Configuration(_)
            | WebError::Registration(_)
            | WebError::Provider(_)
            | WebError::Render(_)
            | WebError::Serialization(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Field-level details for validation failures, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            WebError::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl Clone for WebError {
    fn clone(&self) -> Self {
        match self {
            WebError::NotFound(s) => WebError::NotFound(s.clone()),
            WebError::MethodNotAllowed(m) => WebError::MethodNotAllowed(m.clone()),
            WebError::Unauthorized(s) => WebError::Unauthorized(s.clone()),
            WebError::Forbidden(s) => WebError::Forbidden(s.clone()),
            WebError::BadRequest(s) => WebError::BadRequest(s.clone()),
            WebError::Validation(f) => WebError::Validation(f.clone()),
            WebError::NotAcceptable(s) => WebError::NotAcceptable(s.clone()),
            WebError::PreconditionFailed(s) => WebError::PreconditionFailed(s.clone()),
            WebError::NotModified => WebError::NotModified,
            WebError::UnsupportedMethod(s) => WebError::UnsupportedMethod(s.clone()),
            WebError::Unavailable(s) => WebError::Unavailable(s.clone()),
            WebError::UriTooLong(n) => WebError::UriTooLong(*n),
            WebError::Internal(s) => WebError::Internal(s.clone()),
            WebError::Configuration(s) => WebError::Configuration(s.clone()),
            WebError::Registration(s) => WebError::Registration(s.clone()),
            WebError::Provider(s) => WebError::Provider(s.clone()),
            WebError::Render(s) => WebError::Render(s.clone()),
            WebError::Serialization(s) => WebError::Serialization(s.clone()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

// Error conversions for common error types

impl From<serde_json::Error> for WebError {
    fn from(e: serde_json::Error) -> Self {
        WebError::Serialization(e.to_string())
    }
}

impl From<serde_urlencoded::de::Error> for WebError {
    fn from(e: serde_urlencoded::de::Error) -> Self {
        WebError::BadRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(WebError::NotFound("/x".into()).status_code(), 404);
        assert_eq!(
            WebError::MethodNotAllowed(vec!["GET".into()]).status_code(),
            405
        );
        assert_eq!(WebError::Unauthorized("token".into()).status_code(), 401);
        assert_eq!(WebError::NotModified.status_code(), 304);
        assert_eq!(WebError::UriTooLong(9000).status_code(), 414);
        assert_eq!(WebError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_cause_not_echoed() {
        let err = WebError::Internal("connection string leaked".into());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("connection string"));
    }

    #[test]
    fn test_field_errors_display_is_ordered() {
        let fields: FieldErrors = [("b", "too long"), ("a", "required")]
            .into_iter()
            .collect();
        assert_eq!(fields.to_string(), "a: required; b: too long");
    }

    #[test]
    fn test_not_modified_is_success_halt() {
        assert!(WebError::NotModified.is_success_halt());
        assert!(!WebError::PreconditionFailed("etag".into()).is_success_halt());
    }
}
