use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use uuid::Uuid;

use super::headers::HeaderMap;
use super::method::Method;
use crate::error::{Result, WebError};

/// Path parameters bound by a route match, preserving template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Opaque per-request extension map for adapter data (TLS peer
/// certificate, trace context) and machine-computed values such as the
/// CSP nonce.
#[derive(Default)]
pub struct Extensions {
    inner: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.inner.insert(key.into(), Arc::new(value));
    }

    pub(crate) fn insert_raw(&self, key: String, value: Arc<dyn Any + Send + Sync>) {
        self.inner.insert(key, value);
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.inner
            .get(key)
            .map(|entry| entry.value().clone())
            .and_then(|value| value.downcast::<T>().ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.inner.iter().map(|entry| entry.key().clone()).collect();
        f.debug_struct("Extensions").field("keys", &keys).finish()
    }
}

/// Immutable request as handed over by a transport adapter.
///
/// The only interior state is memoization: decoded body forms parse at
/// most once, path parameters bind once at route match, and the
/// extension map accepts machine-computed values.
pub struct Request {
    request_id: String,
    method: Method,
    path: String,
    query: HashMap<String, Vec<String>>,
    headers: HeaderMap,
    body: Bytes,
    path_params: OnceCell<PathParams>,
    json_cache: OnceCell<std::result::Result<Arc<serde_json::Value>, String>>,
    form_cache: OnceCell<std::result::Result<Arc<HashMap<String, String>>, String>>,
    extensions: Extensions,
}

impl Request {
    /// Construct from the adapter contract: method token, path, raw
    /// query string, headers, body bytes.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query_string: Option<&str>,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path: path.into(),
            query: parse_query_string(query_string.unwrap_or("")),
            headers,
            body: body.into(),
            path_params: OnceCell::new(),
            json_cache: OnceCell::new(),
            form_cache: OnceCell::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Query parameters as a multi-map; repeated keys accumulate in
    /// source order.
    pub fn query_params(&self) -> &HashMap<String, Vec<String>> {
        &self.query
    }

    /// First query value for a key.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// The `Content-Type` value without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.headers.get("content-type").map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Path parameters bound by the route match. Empty before binding.
    pub fn path_params(&self) -> &PathParams {
        static EMPTY: PathParams = PathParams {
            entries: Vec::new(),
        };
        self.path_params.get().unwrap_or(&EMPTY)
    }

    /// Bind path parameters exactly once, at route match.
    pub(crate) fn bind_path_params(&self, params: PathParams) {
        let _ = self.path_params.set(params);
    }

    /// Decoded JSON body. The first parse memoizes; later calls return
    /// the cached value or the cached failure.
    pub fn json_body(&self) -> Result<Arc<serde_json::Value>> {
        let parsed = self.json_cache.get_or_init(|| {
            serde_json::from_slice::<serde_json::Value>(&self.body)
                .map(Arc::new)
                .map_err(|e| e.to_string())
        });
        match parsed {
            Ok(value) => Ok(value.clone()),
            Err(message) => Err(WebError::BadRequest(format!(
                "malformed JSON body: {}",
                message
            ))),
        }
    }

    /// Decoded form fields for `application/x-www-form-urlencoded`
    /// bodies. Memoized like `json_body`.
    pub fn form_body(&self) -> Result<Arc<HashMap<String, String>>> {
        let parsed = self.form_cache.get_or_init(|| {
            serde_urlencoded::from_bytes::<HashMap<String, String>>(&self.body)
                .map(Arc::new)
                .map_err(|e| e.to_string())
        });
        match parsed {
            Ok(value) => Ok(value.clone()),
            Err(message) => Err(WebError::BadRequest(format!(
                "malformed form body: {}",
                message
            ))),
        }
    }

    /// Whether a present body decodes under its declared content type.
    /// JSON is assumed when no `Content-Type` accompanies a body; other
    /// content types pass through for the handler to interpret.
    pub fn body_is_well_formed(&self) -> bool {
        if !self.has_body() {
            return true;
        }
        match self.content_type().as_deref() {
            Some("application/json") | None => self.json_body().is_ok(),
            Some(media) if media.ends_with("+json") => self.json_body().is_ok(),
            Some("application/x-www-form-urlencoded") => self.form_body().is_ok(),
            Some(_) => true,
        }
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Test- and adapter-friendly request construction.
pub struct RequestBuilder {
    method: Method,
    path: String,
    query_string: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_string: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn query_string(mut self, raw: impl Into<String>) -> Self {
        self.query_string = Some(raw.into());
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn json(mut self, value: &serde_json::Value) -> Self {
        self.headers.set("content-type", "application/json");
        self.body = Bytes::from(value.to_string());
        self
    }

    pub fn build(self) -> Request {
        Request::new(
            self.method,
            self.path,
            self.query_string.as_deref(),
            self.headers,
            self.body,
        )
    }
}

fn parse_query_string(raw: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    if raw.is_empty() {
        return params;
    }
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(raw).unwrap_or_default();
    for (key, value) in pairs {
        params.entry(key).or_default().push(value);
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_multi_map() {
        let request = Request::builder(Method::Get, "/search")
            .query_string("tag=a&tag=b&limit=10")
            .build();

        assert_eq!(
            request.query_params().get("tag"),
            Some(&vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(request.query("limit"), Some("10"));
        assert_eq!(request.query("missing"), None);
    }

    #[test]
    fn test_json_body_memoizes_single_parse() {
        let request = Request::builder(Method::Post, "/docs")
            .json(&json!({"x": 1}))
            .build();

        let first = request.json_body().unwrap();
        let second = request.json_body().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first["x"], 1);
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        let request = Request::builder(Method::Post, "/docs")
            .header("content-type", "application/json")
            .body("{not json")
            .build();

        assert!(matches!(
            request.json_body(),
            Err(WebError::BadRequest(_))
        ));
        assert!(!request.body_is_well_formed());
    }

    #[test]
    fn test_empty_body_is_well_formed() {
        let request = Request::builder(Method::Get, "/docs").build();
        assert!(request.body_is_well_formed());
    }

    #[test]
    fn test_opaque_content_type_passes_body_check() {
        let request = Request::builder(Method::Post, "/blobs")
            .header("content-type", "application/octet-stream")
            .body(&b"\x00\x01\x02"[..])
            .build();
        assert!(request.body_is_well_formed());
    }

    #[test]
    fn test_form_body_decoding() {
        let request = Request::builder(Method::Post, "/login")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("user=alice&pass=s3cret")
            .build();

        let form = request.form_body().unwrap();
        assert_eq!(form.get("user").map(String::as_str), Some("alice"));
        assert!(request.body_is_well_formed());
    }

    #[test]
    fn test_path_params_bind_once() {
        let request = Request::builder(Method::Get, "/users/42").build();
        assert!(request.path_params().is_empty());

        let mut params = PathParams::new();
        params.insert("id", "42");
        request.bind_path_params(params);

        let mut rebind = PathParams::new();
        rebind.insert("id", "99");
        request.bind_path_params(rebind);

        assert_eq!(request.path_params().get("id"), Some("42"));
    }

    #[test]
    fn test_extensions_typed_access() {
        let request = Request::builder(Method::Get, "/").build();
        request.extensions().insert("csp_nonce", "abc123".to_string());

        let nonce = request.extensions().get::<String>("csp_nonce").unwrap();
        assert_eq!(nonce.as_str(), "abc123");
        assert!(request.extensions().get::<u64>("csp_nonce").is_none());
    }

    #[test]
    fn test_content_type_strips_parameters() {
        let request = Request::builder(Method::Post, "/docs")
            .header("Content-Type", "Application/JSON; charset=utf-8")
            .body("{}")
            .build();
        assert_eq!(request.content_type().as_deref(), Some("application/json"));
    }
}
