// # Error Dispatch
//
// Maps (status code, chosen media type) to registered error handlers.
// Lookup cascades from the exact pair to the status alone to the
// catch-all; the built-in default emits `{"error", "message"}` through
// the content negotiator, with `text/plain` as the last resort.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::handler::{HandlerFuture, HandlerReturn};
use crate::http::{reason_phrase, Request};
use crate::negotiate::MediaType;

/// An error handler receives the request and a client-safe message;
/// its return renders like a normal handler return.
pub type ErrorHandlerFn = Arc<dyn Fn(Arc<Request>, String) -> HandlerFuture + Send + Sync>;

type ErrorKey = (Option<u16>, Option<String>);

/// Registry of error handlers with cascade lookup.
#[derive(Default)]
pub struct ErrorDispatcher {
    handlers: HashMap<ErrorKey, ErrorHandlerFn>,
}

impl ErrorDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler. `None` slots widen the match: a bare status
    /// catches every media type, the double-`None` key catches
    /// everything.
    pub fn register(
        &mut self,
        status: Option<u16>,
        media_type: Option<MediaType>,
        handler: ErrorHandlerFn,
    ) {
        let key = (status, media_type.map(|m| m.essence()));
        if self.handlers.insert(key.clone(), handler).is_some() {
            tracing::warn!(?key, "error handler re-registered; replacing earlier definition");
        }
    }

    /// Convenience registration for synchronous handler bodies.
    pub fn register_fn<F>(&mut self, status: Option<u16>, media_type: Option<MediaType>, body: F)
    where
        F: Fn(Arc<Request>, String) -> crate::error::Result<HandlerReturn>
            + Send
            + Sync
            + 'static,
    {
        let body = Arc::new(body);
        self.register(
            status,
            media_type,
            Arc::new(move |request, message| {
                let body = body.clone();
                Box::pin(async move { body(request, message) })
            }),
        );
    }

    /// Cascade lookup: exact → (status, None) → (None, None).
    pub fn lookup(&self, status: u16, media_type: Option<&MediaType>) -> Option<ErrorHandlerFn> {
        if let Some(media) = media_type {
            let exact = (Some(status), Some(media.essence()));
            if let Some(handler) = self.handlers.get(&exact) {
                return Some(handler.clone());
            }
        }
        if let Some(handler) = self.handlers.get(&(Some(status), None)) {
            return Some(handler.clone());
        }
        self.handlers.get(&(None, None)).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ErrorDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&ErrorKey> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("ErrorDispatcher").field("keys", &keys).finish()
    }
}

/// The built-in default error body.
pub fn default_error_body(status: u16, message: &str) -> serde_json::Value {
    json!({
        "error": reason_phrase(status),
        "message": message,
    })
}
