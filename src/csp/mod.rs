// # CSP Engine
//
// Directive compilation with keyword auto-quoting, per-request nonce
// generation, and report-only emission. Directives emit in registration
// order, tokens joined by single spaces, directives separated by `; `.

pub mod config;
pub mod nonce;
pub mod policy;

pub use config::{CspConfig, CspSource};
pub use nonce::{generate_nonce, CSP_NONCE_KEY};
pub use policy::{auto_quote, compile, CompiledCsp};
