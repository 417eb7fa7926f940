//! Engine facade: flow handles, registration, and recovery.
//!
//! One `Engine` exists per process. It owns the execution log handle, the
//! wait registry, and the flow registry; everything is shared behind an
//! `Arc`, so the engine clones cheaply into spawned tasks. Construction and
//! teardown are explicit -- nothing here relies on drop order, and task
//! execution is delegated to the ambient tokio runtime.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::FlowError;
use crate::flow::handle::FlowHandle;
use crate::flow::interceptor::Interceptor;
use crate::flow::proxy::FlowProxy;
use crate::flow::registry::FlowRegistry;
use crate::flow::Flow;
use crate::repository::ExecutionLog;
use crate::wait::WaitRegistry;

struct EngineInner<L: ExecutionLog> {
    log: Arc<L>,
    waits: Arc<WaitRegistry>,
    registry: FlowRegistry<L>,
}

/// The durable execution engine.
pub struct Engine<L: ExecutionLog> {
    inner: Arc<EngineInner<L>>,
}

impl<L: ExecutionLog> Clone for Engine<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: ExecutionLog + 'static> Engine<L> {
    pub fn new(log: L) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                log: Arc::new(log),
                waits: Arc::new(WaitRegistry::new()),
                registry: FlowRegistry::new(),
            }),
        }
    }

    /// The execution log, for direct queries (tests, admin tooling).
    pub fn log(&self) -> &Arc<L> {
        &self.inner.log
    }

    /// A handle on the flow `T` with the given identity. The same id always
    /// addresses the same recorded history; a completed flow replays, an
    /// incomplete one resumes from its last completed step.
    pub fn get_flow<T: Flow>(&self, flow_id: Uuid) -> FlowHandle<T, L> {
        FlowHandle::new(FlowProxy::new(
            T::restore(),
            Interceptor::new(
                flow_id,
                Arc::clone(&self.inner.log),
                Arc::clone(&self.inner.waits),
            ),
        ))
    }

    /// Register a flow type for crash recovery. `dispatch` maps a recorded
    /// method name and parameter bytes back onto the typed flow method and
    /// re-dispatches it with `run_async`.
    pub fn register_flow<T, D>(&self, dispatch: D)
    where
        T: Flow,
        D: Fn(FlowHandle<T, L>, &str, Option<&[u8]>) -> Result<(), FlowError>
            + Send
            + Sync
            + 'static,
    {
        self.inner.registry.register::<T, D>(dispatch);
    }

    /// Re-dispatch every flow the log shows as started but not completed.
    /// Intended to run once at startup, after all flow types are
    /// registered. A failure to dispatch one flow is logged and does not
    /// stop recovery of the others; returns how many flows were
    /// re-dispatched.
    pub async fn recover_incomplete_flows(&self) -> Result<usize, FlowError> {
        let incomplete = self.inner.log.get_incomplete_flows().await?;
        if incomplete.is_empty() {
            return Ok(0);
        }

        tracing::info!(count = incomplete.len(), "found incomplete flows, re-dispatching");

        let mut dispatched = 0;
        for invocation in &incomplete {
            tracing::info!(
                flow_id = %invocation.flow_id,
                class = invocation.class_name.as_str(),
                method = invocation.method_name.as_str(),
                attempt = invocation.attempts + 1,
                "re-dispatching incomplete flow"
            );
            match self.inner.registry.dispatch(self, invocation) {
                Ok(()) => dispatched += 1,
                Err(error) => {
                    tracing::warn!(
                        flow_id = %invocation.flow_id,
                        class = invocation.class_name.as_str(),
                        error = %error,
                        "failed to re-dispatch incomplete flow"
                    );
                }
            }
        }
        Ok(dispatched)
    }
}
