// RustyRest - Enterprise-grade decision-machine HTTP framework core
// Core library module

pub mod adapter;
pub mod app;
pub mod conditional;
pub mod cors;
pub mod csp;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod machine;
pub mod metrics;
pub mod negotiate;
pub mod provider;
pub mod router;
pub mod schema;

pub use adapter::{InboundRequest, WireResponse};
pub use app::{Application, ApplicationBuilder, FrameworkConfig};
pub use error::{FieldErrors, Result, WebError};
pub use handler::{Handler, HandlerReturn};
pub use http::{HeaderMap, Method, Request, Response};
pub use machine::{DecisionMachine, DecisionPoint, MachineTrace};
pub use negotiate::{MediaType, Renderer};
pub use provider::{Provider, ProviderArgs, ProviderScope};
pub use router::{Router, RouteOverrides};
