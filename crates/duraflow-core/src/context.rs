//! Per-task call context.
//!
//! The flow handle establishes a [`CallScope`] at the entry of every
//! user-initiated call; the interceptor reads it on any frame logically
//! inside that call. Each tokio task carries its own independent value, so
//! concurrent flows never observe each other's mode.

use crate::error::FlowError;

/// How the current invocation entered the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// A normal flow execution (fresh run or replay).
    Run,
    /// Inside `await_signal`: the next step call blocks until resumed.
    Await,
    /// A resume call delivering arguments to a waiting step.
    Resume,
}

/// The ambient value carried down the call stack of one flow invocation.
#[derive(Debug, Clone, Copy)]
pub struct CallScope {
    pub mode: CallMode,
    /// Whether the task was mounted so that it may park cooperatively.
    /// `false` on the synchronous `run`/`execute` paths, where a delay or
    /// await must be rejected instead of blocking the caller.
    pub suspendable: bool,
}

tokio::task_local! {
    static CALL_SCOPE: CallScope;
}

impl CallScope {
    /// The scope of the current task. Fails when called outside a flow
    /// handle entry point.
    pub fn current() -> Result<CallScope, FlowError> {
        CALL_SCOPE
            .try_with(|scope| *scope)
            .map_err(|_| FlowError::CallContextMissing)
    }

    /// Run `fut` with this scope as the task's ambient value. Scopes nest;
    /// the innermost one wins, and the previous value is restored on exit.
    pub async fn enter<F: Future>(self, fut: F) -> F::Output {
        CALL_SCOPE.scope(self, fut).await
    }
}
