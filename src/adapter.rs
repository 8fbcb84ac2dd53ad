// # Adapter Contract
//
// The single transport seam. Inbound, an adapter hands over the raw
// request tuple (method token, path, query string, header pairs, body
// bytes, extension values) and receives a typed `Request`. Outbound,
// `WireResponse` is the (status, ordered header pairs, body) triple
// adapters emit natively. Everything transport-specific (socket
// handling, HTTP parsing, TLS) stays on the adapter's side.

use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, WebError};
use crate::http::{HeaderMap, Method, Request, Response};

/// Raw inbound request as adapters deliver it. Header names arrive in
/// whatever case the wire carried; normalization happens on
/// conversion.
pub struct InboundRequest {
    method: String,
    path: String,
    query_string: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
    extensions: Vec<(String, Arc<dyn Any + Send + Sync>)>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query_string: None,
            headers: Vec::new(),
            body: Bytes::new(),
            extensions: Vec::new(),
        }
    }

    pub fn query_string(mut self, raw: impl Into<String>) -> Self {
        self.query_string = Some(raw.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(pairs);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach an adapter extension (TLS peer certificate, trace
    /// context); handlers read these through the request extension map.
    pub fn extension<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.extensions.push((key.into(), Arc::new(value)));
        self
    }

    /// Convert into the core request type. An empty method token is the
    /// only rejection; unknown tokens map to `Method::Unknown` and halt
    /// later with `501`.
    pub fn into_request(self) -> Result<Request> {
        if self.method.trim().is_empty() {
            return Err(WebError::BadRequest("empty method token".to_string()));
        }
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            headers.append(name, value.clone());
        }
        let request = Request::new(
            Method::parse(self.method.trim()),
            self.path,
            self.query_string.as_deref(),
            headers,
            self.body,
        );
        for (key, value) in self.extensions {
            request.extensions().insert_raw(key, value);
        }
        Ok(request)
    }
}

impl std::fmt::Debug for InboundRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers.len())
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// The outbound triple adapters emit: status, ordered header pairs as
/// bytes (UTF-8 with latin-1 fallback already applied), body bytes.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Bytes,
}

impl WireResponse {
    pub fn from_response(response: &Response) -> Self {
        let (status, headers, body) = response.to_wire();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Header values as UTF-8 where they decode; adapters needing raw
    /// bytes use `headers` directly.
    pub fn header_str(&self, name: &str) -> Option<String> {
        let wanted = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(header, _)| header == &wanted)
            .and_then(|(_, value)| String::from_utf8(value.clone()).ok())
    }
}

impl From<Response> for WireResponse {
    fn from(response: Response) -> Self {
        Self::from_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_conversion() {
        let request = InboundRequest::new("GET", "/users/7")
            .query_string("expand=profile")
            .header("Accept", "application/json")
            .header("X-Forwarded-For", "10.0.0.1")
            .into_request()
            .unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.path(), "/users/7");
        assert_eq!(request.query("expand"), Some("profile"));
        assert_eq!(request.headers().get("accept"), Some("application/json"));
    }

    #[test]
    fn test_unknown_method_token_maps_to_unknown() {
        let request = InboundRequest::new("BREW", "/coffee")
            .into_request()
            .unwrap();
        assert_eq!(request.method(), Method::Unknown);
    }

    #[test]
    fn test_empty_method_rejected() {
        assert!(matches!(
            InboundRequest::new("  ", "/x").into_request(),
            Err(WebError::BadRequest(_))
        ));
    }

    #[test]
    fn test_extensions_flow_through() {
        #[derive(Debug, PartialEq)]
        struct PeerCert(&'static str);

        let request = InboundRequest::new("GET", "/secure")
            .extension("tls_peer_cert", PeerCert("CN=client"))
            .into_request()
            .unwrap();

        let cert = request
            .extensions()
            .get::<PeerCert>("tls_peer_cert")
            .unwrap();
        assert_eq!(*cert, PeerCert("CN=client"));
    }

    #[test]
    fn test_wire_response_round_trip() {
        let response = Response::new(201)
            .with_content_type("application/json")
            .with_header("Set-Cookie", "a=1")
            .with_header("Set-Cookie", "b=2")
            .with_body("{}");

        let wire = WireResponse::from_response(&response);
        assert_eq!(wire.status, 201);
        assert_eq!(
            wire.header_str("content-type").as_deref(),
            Some("application/json")
        );
        let cookies: Vec<&str> = wire
            .headers
            .iter()
            .filter(|(name, _)| name == "set-cookie")
            .map(|(_, value)| std::str::from_utf8(value).unwrap())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(wire.body.as_ref(), b"{}");
    }
}
