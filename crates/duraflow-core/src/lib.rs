//! Engine core for Duraflow, a durable execution engine.
//!
//! A flow is an ordinary async function whose step calls are routed through a
//! [`FlowProxy`]. Every intercepted call is recorded in an execution log so
//! that after a crash or restart the flow replays to the last completed step
//! without repeating side effects. This crate contains the engine itself:
//!
//! - `codec` -- serialization of step parameters and return values
//! - `context` -- the per-task call mode (run / await / resume)
//! - `wait` -- the process-wide registry of flows blocked on a signal
//! - `repository` -- the `ExecutionLog` port implemented by the storage layer
//! - `flow` -- interceptor state machine, proxy, handle, and flow registry
//! - `engine` -- engine facade and recovery of incomplete flows
//!
//! The storage implementation lives in `duraflow-infra`; this crate depends
//! only on `duraflow-types` and never on a database or IO crate.

pub mod codec;
pub mod context;
pub mod engine;
pub mod error;
pub mod flow;
pub mod repository;
pub mod wait;

#[cfg(test)]
pub(crate) mod testlog;

pub use context::{CallMode, CallScope};
pub use engine::Engine;
pub use error::FlowError;
pub use flow::{Flow, FlowHandle, FlowProxy, await_signal};
pub use repository::{ExecutionLog, StartInvocation};
pub use wait::WaitRegistry;
