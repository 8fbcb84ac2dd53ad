// # HTTP Value Model
//
// Immutable request/response/header/body representations shared by the
// decision machine, the provider resolver, and transport adapters.
//
// ## Modules
//
// - **method**: closed method enum with a catch-all for unknown tokens
// - **headers**: case-insensitive multi-value header map
// - **request**: adapter-constructed request with memoized body decoding
// - **response**: status/headers/body triple emitted back to the adapter

pub mod headers;
pub mod method;
pub mod request;
pub mod response;

pub use headers::HeaderMap;
pub use method::Method;
pub use request::{Extensions, PathParams, Request, RequestBuilder};
pub use response::{reason_phrase, Response};
