use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use super::accept::{negotiate, MediaType};
use crate::error::{Result, WebError};
use crate::http::Request;

/// Input to a renderer: the handler's return value (injected under the
/// handler's own name in the provider model) and the request it answers.
pub struct RenderInput {
    pub value: serde_json::Value,
    pub request: Arc<Request>,
}

pub type RenderFuture = Pin<Box<dyn Future<Output = Result<Bytes>> + Send>>;
pub type RenderFn = Arc<dyn Fn(RenderInput) -> RenderFuture + Send + Sync>;

/// A renderer converts a handler's structured return into a byte body
/// for one media type.
#[derive(Clone)]
pub struct Renderer {
    media_type: MediaType,
    func: RenderFn,
}

impl Renderer {
    pub fn new(media_type: MediaType, func: RenderFn) -> Self {
        Self { media_type, func }
    }

    /// Convenience constructor for synchronous render bodies.
    pub fn from_fn<F>(media_type: MediaType, body: F) -> Self
    where
        F: Fn(RenderInput) -> Result<Bytes> + Send + Sync + 'static,
    {
        let body = Arc::new(body);
        Self::new(
            media_type,
            Arc::new(move |input| {
                let body = body.clone();
                Box::pin(async move { body(input) })
            }),
        )
    }

    /// The implicit fallback renderer for structured returns.
    pub fn json() -> Self {
        Self::from_fn(MediaType::json(), |input| {
            let rendered = serde_json::to_vec(&input.value)
                .map_err(|e| WebError::Render(e.to_string()))?;
            Ok(Bytes::from(rendered))
        })
    }

    /// Plain-text renderer; strings emit bare, other values emit as
    /// compact JSON.
    pub fn plain_text() -> Self {
        Self::from_fn(MediaType::plain_text(), |input| {
            let rendered = match &input.value {
                serde_json::Value::String(text) => text.clone().into_bytes(),
                other => serde_json::to_vec(other)
                    .map_err(|e| WebError::Render(e.to_string()))?,
            };
            Ok(Bytes::from(rendered))
        })
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub async fn render(&self, value: serde_json::Value, request: Arc<Request>) -> Result<Bytes> {
        (self.func)(RenderInput { value, request }).await
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("media_type", &self.media_type.essence())
            .finish()
    }
}

/// The renderer offer for one request: route renderers first, then
/// global renderers, then the implicit JSON fallback. First
/// registration wins for a repeated media type.
#[derive(Clone, Debug, Default)]
pub struct RendererSet {
    renderers: Vec<Renderer>,
}

impl RendererSet {
    pub fn new() -> Self {
        Self {
            renderers: Vec::new(),
        }
    }

    /// Compose from policy layers, most specific first.
    pub fn compose(layers: &[&[Renderer]], implicit_json_fallback: bool) -> Self {
        let mut set = Self::new();
        for layer in layers {
            for renderer in *layer {
                set.push(renderer.clone());
            }
        }
        if implicit_json_fallback {
            set.push(Renderer::json());
        }
        set
    }

    /// Append unless the media type is already offered by a more
    /// specific layer.
    pub fn push(&mut self, renderer: Renderer) {
        if !self.offers(renderer.media_type()) {
            self.renderers.push(renderer);
        }
    }

    pub fn offers(&self, media_type: &MediaType) -> bool {
        self.renderers
            .iter()
            .any(|renderer| renderer.media_type() == media_type)
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn media_types(&self) -> Vec<MediaType> {
        self.renderers
            .iter()
            .map(|renderer| renderer.media_type().clone())
            .collect()
    }

    /// Negotiate against an `Accept` header and return the chosen
    /// renderer.
    pub fn select(&self, accept: Option<&str>) -> Option<&Renderer> {
        let offered = self.media_types();
        let chosen = negotiate(accept, &offered)?;
        self.renderers
            .iter()
            .find(|renderer| renderer.media_type() == &chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use serde_json::json;

    fn request() -> Arc<Request> {
        Arc::new(Request::builder(Method::Get, "/").build())
    }

    #[tokio::test]
    async fn test_json_renderer() {
        let renderer = Renderer::json();
        let body = renderer
            .render(json!({"a": 1}), request())
            .await
            .unwrap();
        assert_eq!(body.as_ref(), br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_plain_text_renderer_unwraps_strings() {
        let renderer = Renderer::plain_text();
        let body = renderer
            .render(json!("hello"), request())
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"hello");

        let body = renderer.render(json!([1, 2]), request()).await.unwrap();
        assert_eq!(body.as_ref(), b"[1,2]");
    }

    #[test]
    fn test_compose_specific_layer_wins() {
        let route_html = Renderer::from_fn(MediaType::html(), |_| Ok(Bytes::from("route")));
        let global_html = Renderer::from_fn(MediaType::html(), |_| Ok(Bytes::from("global")));

        let set = RendererSet::compose(
            &[
                std::slice::from_ref(&route_html),
                std::slice::from_ref(&global_html),
            ],
            true,
        );

        let types = set.media_types();
        assert_eq!(types.len(), 2);
        assert!(set.offers(&MediaType::html()));
        assert!(set.offers(&MediaType::json()));
    }

    #[test]
    fn test_select_uses_negotiation() {
        let set = RendererSet::compose(
            &[&[Renderer::json(), Renderer::plain_text()][..]],
            false,
        );

        let chosen = set.select(Some("text/plain;q=0.9, application/json"));
        assert_eq!(chosen.unwrap().media_type().essence(), "application/json");

        assert!(set.select(Some("image/png")).is_none());
    }

    #[test]
    fn test_implicit_fallback_toggle() {
        let empty = RendererSet::compose(&[], false);
        assert!(empty.is_empty());

        let fallback = RendererSet::compose(&[], true);
        assert!(fallback.offers(&MediaType::json()));
    }
}
