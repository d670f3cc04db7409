//! Signature-driven request binding: classify a handler's parameters once, then bind every
//! matching request's query/body/path data to them.

pub mod kwargs;
pub mod plan;
pub mod signature;

pub use kwargs::Kwargs;
pub use plan::{handler, BindingPlan, Handler, HandlerFuture, HandlerResult};
pub use signature::{classify, Param, ParamClassification, ParamKind, Signature, REQUEST_PARAM};
