// # Route Table & Composition
//
// Path-template compilation, exact segment matching with
// literal-over-parameter preference, method_not_allowed reporting with
// the `Allow` set, and sub-router mounting with policy inheritance.

pub mod compose;
pub mod route;
pub mod table;
pub mod template;

pub use compose::{Router, RouteSpec};
pub use route::{PolicyLayer, Route, RouteOverrides};
pub use table::{RouteLookup, RouteTable};
pub use template::{PathTemplate, Segment};
