//! User-facing flow entry points.
//!
//! A [`FlowHandle`] establishes the call mode for everything invoked through
//! it. `run` and `execute` stay on the caller's task and therefore reject
//! delays and awaits; `run_async` and `execute_async` mount the flow on its
//! own tokio task, which can park cooperatively. `resume` delivers an
//! external signal to a waiting flow, and [`await_signal`] marks the step
//! call that blocks for one.

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::context::{CallMode, CallScope};
use crate::error::FlowError;
use crate::flow::Flow;
use crate::flow::proxy::FlowProxy;
use crate::repository::ExecutionLog;

/// One execution of a flow: the proxy plus the entry points that set up the
/// call context around it.
pub struct FlowHandle<T, L> {
    proxy: FlowProxy<T, L>,
}

impl<T: Flow, L: ExecutionLog + 'static> FlowHandle<T, L> {
    pub(crate) fn new(proxy: FlowProxy<T, L>) -> Self {
        Self { proxy }
    }

    pub fn id(&self) -> Uuid {
        self.proxy.flow_id()
    }

    pub fn proxy(&self) -> &FlowProxy<T, L> {
        &self.proxy
    }

    /// Run the flow on the current task, discarding its return value.
    /// Returns when the flow completes or fails. A delay or await inside
    /// the flow fails with `RequiresAsyncExecution`.
    pub async fn run<R, F, Fut>(&self, body: F) -> Result<(), FlowError>
    where
        F: FnOnce(FlowProxy<T, L>) -> Fut,
        Fut: Future<Output = Result<R, FlowError>>,
    {
        self.execute(body).await.map(|_| ())
    }

    /// Run the flow on the current task and propagate its return value.
    pub async fn execute<R, F, Fut>(&self, body: F) -> Result<R, FlowError>
    where
        F: FnOnce(FlowProxy<T, L>) -> Fut,
        Fut: Future<Output = Result<R, FlowError>>,
    {
        CallScope {
            mode: CallMode::Run,
            suspendable: false,
        }
        .enter(body(self.proxy.clone()))
        .await
    }

    /// Mount the flow on its own tokio task and return immediately. The
    /// task may park for delays and external signals.
    pub fn run_async<R, F, Fut>(&self, body: F) -> JoinHandle<Result<(), FlowError>>
    where
        R: Send + 'static,
        F: FnOnce(FlowProxy<T, L>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, FlowError>> + Send + 'static,
    {
        let proxy = self.proxy.clone();
        tokio::spawn(async move {
            let flow_id = proxy.flow_id();
            let result = CallScope {
                mode: CallMode::Run,
                suspendable: true,
            }
            .enter(body(proxy))
            .await;
            if let Err(error) = &result {
                tracing::error!(flow_id = %flow_id, error = %error, "async flow run failed");
            }
            result.map(|_| ())
        })
    }

    /// Like [`run_async`](Self::run_async), but the join handle yields the
    /// flow's eventual return value.
    pub fn execute_async<R, F, Fut>(&self, body: F) -> JoinHandle<Result<R, FlowError>>
    where
        R: Send + 'static,
        F: FnOnce(FlowProxy<T, L>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, FlowError>> + Send + 'static,
    {
        let proxy = self.proxy.clone();
        tokio::spawn(async move {
            CallScope {
                mode: CallMode::Run,
                suspendable: true,
            }
            .enter(body(proxy))
            .await
        })
    }

    /// Deliver an external signal. The body is expected to call exactly one
    /// step method, the one whose row is currently waiting; its arguments
    /// are handed to the awaiting task. Returns once the signal is
    /// delivered, without waiting for the resumed flow to finish.
    pub async fn resume<R, F, Fut>(&self, body: F) -> Result<(), FlowError>
    where
        F: FnOnce(FlowProxy<T, L>) -> Fut,
        Fut: Future<Output = Result<R, FlowError>>,
    {
        CallScope {
            mode: CallMode::Resume,
            suspendable: false,
        }
        .enter(body(self.proxy.clone()))
        .await
        .map(|_| ())
    }
}

/// Mark a blocking pause for an external signal.
///
/// The thunk is expected to perform exactly one step call on the flow's
/// proxy; that call parks until another caller resumes the flow with the
/// step's real arguments. Only valid inside a flow entered through a flow
/// handle, and only on the async paths.
pub async fn await_signal<R, F, Fut>(thunk: F) -> Result<R, FlowError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R, FlowError>>,
{
    let scope = CallScope::current()?;
    CallScope {
        mode: CallMode::Await,
        suspendable: scope.suspendable,
    }
    .enter(thunk())
    .await
}
