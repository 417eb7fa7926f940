//! Class-name dispatch for crash recovery.
//!
//! Recovery only knows a flow by what the log recorded: a class name, a
//! method name, and serialized parameters. The registry maps class names to
//! type-erased dispatch closures that decode the parameters and re-enter the
//! right typed flow method.

use dashmap::DashMap;
use duraflow_types::Invocation;

use crate::engine::Engine;
use crate::error::FlowError;
use crate::flow::Flow;
use crate::flow::handle::FlowHandle;
use crate::repository::ExecutionLog;

type DispatchFn<L> = Box<dyn Fn(&Engine<L>, &Invocation) -> Result<(), FlowError> + Send + Sync>;

/// Map from a flow type's class name to its recovery dispatcher.
pub struct FlowRegistry<L: ExecutionLog> {
    dispatchers: DashMap<String, DispatchFn<L>>,
}

impl<L: ExecutionLog + 'static> FlowRegistry<L> {
    pub(crate) fn new() -> Self {
        Self {
            dispatchers: DashMap::new(),
        }
    }

    /// Register a flow type. `dispatch` receives a handle for the recorded
    /// flow id, the recorded method name, and the recorded parameter bytes;
    /// it decodes the parameters and re-dispatches the method with
    /// `run_async`, or fails with `UnknownMethod`.
    pub(crate) fn register<T, D>(&self, dispatch: D)
    where
        T: Flow,
        D: Fn(FlowHandle<T, L>, &str, Option<&[u8]>) -> Result<(), FlowError>
            + Send
            + Sync
            + 'static,
    {
        let dispatcher: DispatchFn<L> = Box::new(move |engine, invocation| {
            let handle = engine.get_flow::<T>(invocation.flow_id);
            dispatch(
                handle,
                &invocation.method_name,
                invocation.parameters.as_deref(),
            )
        });
        if self
            .dispatchers
            .insert(T::NAME.to_string(), dispatcher)
            .is_some()
        {
            tracing::warn!(class = T::NAME, "replaced existing flow registration");
        }
    }

    pub(crate) fn dispatch(
        &self,
        engine: &Engine<L>,
        invocation: &Invocation,
    ) -> Result<(), FlowError> {
        match self.dispatchers.get(&invocation.class_name) {
            Some(dispatcher) => dispatcher(engine, invocation),
            None => Err(FlowError::UnknownFlow(invocation.class_name.clone())),
        }
    }
}
