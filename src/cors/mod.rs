// # CORS Engine
//
// Preflight synthesis and actual-request decoration for the covered
// subset of the Fetch Standard. Origin validation checks an exact set
// plus label-aware subdomain wildcards; `Vary: Origin` rides along
// whenever the emitted allow-origin depends on the request.

pub mod config;
pub mod engine;
pub mod matcher;

pub use config::{CorsConfig, OriginPolicy};
pub use engine::{is_preflight, CompiledCors};
pub use matcher::OriginMatcher;
