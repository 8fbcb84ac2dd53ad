// # Content Negotiation
//
// `Accept` parsing per the RFC 7231 grammar and renderer selection.
// Quality values rank entries; source order breaks ties; the full
// wildcard takes the first offered type; partial wildcards are
// deliberately unmatched.

pub mod accept;
pub mod renderer;

pub use accept::{negotiate, parse_accept, MediaRange, MediaType};
pub use renderer::{RenderFn, RenderFuture, RenderInput, Renderer, RendererSet};
