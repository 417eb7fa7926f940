//! The interceptor: per-call state machine of the engine.
//!
//! Every durable method call lands here with its descriptor, its argument
//! tuple, and an invoker for the original body. Consulting the execution log
//! and the ambient call mode, the interceptor decides whether to replay a
//! recorded result, execute fresh, sleep out a delay, block for an external
//! signal, or deliver one -- and records starts and completions so the
//! decision is the same after any crash.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use duraflow_types::{CodecError, InvocationStatus, MethodRef, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::codec;
use crate::context::{CallMode, CallScope};
use crate::error::FlowError;
use crate::repository::{ExecutionLog, StartInvocation};
use crate::wait::WaitRegistry;

/// Per-flow-instance interception state.
///
/// `step` is the next step index to consult or assign. It is reset to 0
/// whenever a flow method begins and is only ever touched by the single task
/// currently executing this flow.
pub struct Interceptor<L> {
    flow_id: Uuid,
    step: AtomicU32,
    log: Arc<L>,
    waits: Arc<WaitRegistry>,
}

impl<L: ExecutionLog> Interceptor<L> {
    pub(crate) fn new(flow_id: Uuid, log: Arc<L>, waits: Arc<WaitRegistry>) -> Self {
        Self {
            flow_id,
            step: AtomicU32::new(0),
            log,
            waits,
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    /// Route one intercepted call. `invoke` runs the original method body
    /// with a possibly substituted argument tuple (an await wakes up with
    /// the arguments its resume delivered).
    pub(crate) async fn intercept<A, R, F, Fut>(
        &self,
        method: &MethodRef,
        args: A,
        invoke: F,
    ) -> Result<R, FlowError>
    where
        A: Serialize + DeserializeOwned + Send,
        R: Serialize + DeserializeOwned,
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<R, FlowError>>,
    {
        let scope = CallScope::current()?;

        if method.is_flow() {
            self.step.store(0, Ordering::SeqCst);
            tracing::info!(
                flow_id = %self.flow_id,
                class = method.class_name,
                method = method.method_name,
                "starting flow"
            );
        }

        // The anchor row this call is compared against. A resume does not
        // know its step index up front; the latest recorded row is the one
        // currently waiting.
        let anchor = if scope.mode == CallMode::Resume {
            let latest = self
                .log
                .get_latest_invocation(self.flow_id)
                .await?
                .ok_or(FlowError::NoFlowToResume(self.flow_id))?;
            self.step.store(latest.step, Ordering::SeqCst);
            Some(latest)
        } else {
            self.log
                .get_invocation(self.flow_id, self.step.load(Ordering::SeqCst))
                .await?
        };

        let step = self.step.load(Ordering::SeqCst);
        let mut remaining_delay = None;

        if let Some(anchor) = &anchor {
            // The observed sequence of calls during replay must equal the
            // recorded one.
            if anchor.class_name != method.class_name
                || anchor.method_name != method.method_name
            {
                return Err(FlowError::IncompatibleFlowStructure {
                    step,
                    recorded: format!("{}.{}", anchor.class_name, anchor.method_name),
                    called: format!("{}.{}", method.class_name, method.method_name),
                });
            }

            match anchor.status {
                InvocationStatus::Complete => {
                    // Replay hit: the body is not called again, ever.
                    let recorded = anchor.return_value.as_deref().ok_or_else(|| {
                        StoreError::Corrupt("complete row without return value".to_string())
                    })?;
                    let value = codec::decode(recorded)?;
                    self.step.store(step + 1, Ordering::SeqCst);
                    tracing::info!(
                        flow_id = %self.flow_id,
                        step,
                        method = method.method_name,
                        "replaying completed step"
                    );
                    return Ok(value);
                }
                InvocationStatus::WaitingForSignal if scope.mode == CallMode::Resume => {
                    // Signal delivery. The body runs on the originally
                    // awaiting task, not here; record the delivered
                    // arguments, hand them over, and wake it.
                    let params = codec::encode(&args)?;
                    self.log
                        .log_resume_parameters(self.flow_id, step, &params)
                        .await?;
                    self.waits.deliver(self.flow_id, params);
                    tracing::info!(
                        flow_id = %self.flow_id,
                        step,
                        method = method.method_name,
                        "delivered resume signal"
                    );
                    return Ok(codec::unit()?);
                }
                _ if scope.mode == CallMode::Resume => {
                    // A resume may only target the step that is waiting.
                    return Err(FlowError::IncompatibleFlowStructure {
                        step,
                        recorded: format!("{}.{}", anchor.class_name, anchor.method_name),
                        called: format!("{}.{}", method.class_name, method.method_name),
                    });
                }
                _ => {
                    tracing::info!(
                        flow_id = %self.flow_id,
                        step,
                        attempt = anchor.attempts + 1,
                        method = method.method_name,
                        "retrying incomplete step"
                    );
                    // The recorded timestamp is the first start's (retried
                    // starts never refresh it), so a crashed delayed step
                    // measures against the original deadline instead of
                    // re-waiting the full delay.
                    if let Some(ms) = anchor.delay_millis {
                        let deadline = anchor.timestamp + chrono::Duration::milliseconds(ms);
                        remaining_delay = (deadline - Utc::now())
                            .to_std()
                            .ok()
                            .filter(|d| !d.is_zero());
                    }
                }
            }
        }

        // An await's own arguments are placeholders; the meaningful tuple
        // arrives with the resume and is recorded at delivery.
        let start_status = if scope.mode == CallMode::Await {
            InvocationStatus::WaitingForSignal
        } else {
            InvocationStatus::Pending
        };
        let params = if scope.mode == CallMode::Await {
            None
        } else {
            Some(codec::encode(&args)?)
        };
        self.log
            .log_start(StartInvocation {
                flow_id: self.flow_id,
                step,
                class_name: method.class_name,
                method_name: method.method_name,
                delay_millis: method.delay().map(|d| d.as_millis()),
                status: start_status,
                parameters: params.as_deref(),
            })
            .await?;

        let sleep_for = if anchor.is_none() {
            method.delay().map(|d| d.duration()).filter(|d| !d.is_zero())
        } else {
            remaining_delay
        };

        let mut args = args;
        if let Some(pause) = sleep_for {
            if !scope.suspendable {
                return Err(FlowError::RequiresAsyncExecution {
                    flow_id: self.flow_id,
                    step,
                });
            }
            tracing::info!(
                flow_id = %self.flow_id,
                step,
                pause_millis = pause.as_millis() as u64,
                "delaying step"
            );
            tokio::time::sleep(pause).await;
        } else if scope.mode == CallMode::Await {
            // A crash can separate a resume's log write from its in-memory
            // delivery. The row is authoritative: a waiting anchor that
            // already carries parameters was resumed, and waiting again
            // would park forever since the resumer has long returned.
            let recorded = anchor
                .as_ref()
                .filter(|a| a.status == InvocationStatus::WaitingForSignal)
                .and_then(|a| a.parameters.clone());
            let delivered = match recorded {
                Some(recorded) => {
                    tracing::info!(
                        flow_id = %self.flow_id,
                        step,
                        method = method.method_name,
                        "resuming await from recorded arguments"
                    );
                    recorded
                }
                None => {
                    if !scope.suspendable {
                        return Err(FlowError::RequiresAsyncExecution {
                            flow_id: self.flow_id,
                            step,
                        });
                    }
                    tracing::info!(
                        flow_id = %self.flow_id,
                        step,
                        method = method.method_name,
                        "waiting for external signal"
                    );
                    self.waits.wait(self.flow_id).await.ok_or_else(|| {
                        CodecError::Decode("resume signal carried no arguments".to_string())
                    })?
                }
            };
            args = codec::decode(&delivered)?;
        }

        let current_step = step;
        self.step.store(step + 1, Ordering::SeqCst);
        tracing::info!(
            flow_id = %self.flow_id,
            step = current_step,
            class = method.class_name,
            method = method.method_name,
            "executing step"
        );

        // A user error propagates unchanged; the row stays pending and the
        // next run of the flow retries this step.
        let result = invoke(args).await?;

        let return_bytes = codec::encode(&result)?;
        self.log
            .log_completion(self.flow_id, current_step, &return_bytes)
            .await?;
        tracing::debug!(flow_id = %self.flow_id, step = current_step, "completed step");
        Ok(result)
    }
}
