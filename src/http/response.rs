use bytes::Bytes;

use super::headers::HeaderMap;

/// Response emitted to the adapter: status, ordered multi-value headers,
/// optional body. Constructed by the decision machine or error dispatch;
/// handlers may also build one directly for full control.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_content_type(mut self, media_type: impl Into<String>) -> Self {
        self.headers.set("content-type", media_type.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Drop the body while keeping entity headers; used for `HEAD`
    /// responses and `304` halts.
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Emit the adapter triple: status, ordered header pairs as bytes,
    /// body bytes.
    pub fn to_wire(&self) -> (u16, Vec<(String, Vec<u8>)>, Bytes) {
        (
            self.status,
            self.headers.to_wire(),
            self.body.clone().unwrap_or_default(),
        )
    }
}

/// Reason phrase for the status codes the machine and error dispatch
/// produce. Unlisted codes report as "Unknown Status".
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown Status",
    }
}
