//! The execution log port.
//!
//! Defines the storage interface the engine writes flow progress through.
//! The infrastructure layer (`duraflow-infra`) implements this trait with
//! SQLite persistence; tests use an in-memory implementation.
//!
//! Every operation is a single atomic transaction from the caller's point of
//! view. Uses native async fn in traits (no async_trait macro).

use duraflow_types::{Invocation, InvocationStatus, StoreError};
use uuid::Uuid;

/// Parameters of a start record, grouped to keep `log_start` readable.
#[derive(Debug, Clone, Copy)]
pub struct StartInvocation<'a> {
    pub flow_id: Uuid,
    pub step: u32,
    pub class_name: &'a str,
    pub method_name: &'a str,
    pub delay_millis: Option<i64>,
    pub status: InvocationStatus,
    /// Serialized argument tuple; `None` for a row created by an await,
    /// whose arguments arrive later with the resume.
    pub parameters: Option<&'a [u8]>,
}

/// Durable store of invocation rows keyed by `(flow_id, step)`.
pub trait ExecutionLog: Send + Sync {
    /// Record the start of an invocation. Inserts the row on first
    /// encounter; on a retried start of the same `(flow_id, step)` it
    /// increments `attempts` and refreshes `status`, leaving the first
    /// start's timestamp, the originally captured parameters, the method
    /// identity, and the delay untouched.
    fn log_start(
        &self,
        start: StartInvocation<'_>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Record successful completion: sets status `Complete` and stores the
    /// serialized return value. Fails with `StoreError::NotFound` if the row
    /// is absent.
    fn log_completion(
        &self,
        flow_id: Uuid,
        step: u32,
        return_value: &[u8],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Record the argument tuple delivered by a resume on a waiting row
    /// whose parameters are still unset. The first write wins; repeated
    /// deliveries leave the row unchanged. Fails with `StoreError::NotFound`
    /// if the row is absent.
    fn log_resume_parameters(
        &self,
        flow_id: Uuid,
        step: u32,
        parameters: &[u8],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Exact lookup of one invocation row.
    fn get_invocation(
        &self,
        flow_id: Uuid,
        step: u32,
    ) -> impl Future<Output = Result<Option<Invocation>, StoreError>> + Send;

    /// The row with the highest step for this flow, used by resume to locate
    /// the currently waiting step.
    fn get_latest_invocation(
        &self,
        flow_id: Uuid,
    ) -> impl Future<Output = Result<Option<Invocation>, StoreError>> + Send;

    /// All flow rows (`step = 0`) that never completed, oldest first.
    fn get_incomplete_flows(
        &self,
    ) -> impl Future<Output = Result<Vec<Invocation>, StoreError>> + Send;

    /// Drop every row. Test and administrative use only.
    fn reset(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
