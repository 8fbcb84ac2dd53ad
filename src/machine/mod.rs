// # Decision Machine
//
// The ordered decision graph that turns a request into a response. Each
// point either continues or halts; halts flow into error dispatch, the
// conditional `304` and synthesized `OPTIONS` responses halt in success
// shape. Applications override individual points by registering
// providers under the point's name, with route-decorator overrides
// outranking route providers, router providers, and app providers in
// that order.

pub mod machine;
pub mod outcome;

pub use machine::DecisionMachine;
pub use outcome::{DecisionPoint, MachineTrace};
