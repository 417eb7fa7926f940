//! Engine error type.

use duraflow_types::{CodecError, StoreError};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by flow execution.
///
/// `User` wraps whatever a step body returned; the interceptor never catches
/// it, never retries within a single invocation, and leaves the step's row
/// pending so the next run of the flow retries it.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The execution log failed; the flow is not advanced.
    #[error("execution log error: {0}")]
    Store(#[from] StoreError),

    /// Parameters or a return value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Codec(#[from] CodecError),

    /// During replay, the observed call at a step differs from the recorded
    /// one. The run is aborted; the log is left unchanged by this attempt.
    #[error("incompatible change of flow structure")]
    IncompatibleFlowStructure {
        step: u32,
        recorded: String,
        called: String,
    },

    /// A delay or await was reached on a task that cannot park
    /// cooperatively; use `run_async` or `execute_async` instead.
    #[error("flow {flow_id} reached a suspension point at step {step} on a non-suspendable task")]
    RequiresAsyncExecution { flow_id: Uuid, step: u32 },

    /// Resume was invoked for a flow with no recorded steps.
    #[error("no flow to resume for id {0}")]
    NoFlowToResume(Uuid),

    /// The call context was read outside a flow handle entry point.
    #[error("no call context on this task; enter flows through a flow handle")]
    CallContextMissing,

    /// Recovery found a flow whose class name has no registered dispatcher.
    #[error("no flow registered under class name '{0}'")]
    UnknownFlow(String),

    /// A registered dispatcher does not know the recorded method.
    #[error("flow '{class}' has no recoverable method '{method}'")]
    UnknownMethod { class: String, method: String },

    /// An error raised by a user step body; propagates unchanged.
    #[error(transparent)]
    User(#[from] anyhow::Error),
}
