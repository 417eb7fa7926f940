//! The persisted invocation record.
//!
//! One `Invocation` row exists per `(flow_id, step)` pair. Step 0 is the
//! top-level flow method; steps 1, 2, ... are the step calls made by that
//! flow in execution order. Parameters and return values are opaque bytes
//! produced by the codec; the engine never inspects them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// InvocationStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of an invocation row.
///
/// Allowed transitions: `Pending -> Complete` and
/// `Pending -> WaitingForSignal -> Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvocationStatus {
    /// Started but not finished; a crashed or failed attempt leaves this.
    Pending,
    /// Blocked until an external resume delivers the step's arguments.
    WaitingForSignal,
    /// Finished successfully; `return_value` is recorded.
    Complete,
}

impl InvocationStatus {
    /// Stable text form used in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationStatus::Pending => "PENDING",
            InvocationStatus::WaitingForSignal => "WAITING_FOR_SIGNAL",
            InvocationStatus::Complete => "COMPLETE",
        }
    }

    /// Parse the stored text form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(InvocationStatus::Pending),
            "WAITING_FOR_SIGNAL" => Some(InvocationStatus::WaitingForSignal),
            "COMPLETE" => Some(InvocationStatus::Complete),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// One attempted execution of a flow or step method, as persisted in the
/// execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// Externally supplied identity tying all rows of one flow together.
    pub flow_id: Uuid,
    /// Position within the flow; 0 is the flow method itself.
    pub step: u32,
    /// Wall-clock instant of the first start attempt (ms resolution);
    /// retried starts do not refresh it.
    pub timestamp: DateTime<Utc>,
    /// Identity of the type that declared the invoked method.
    pub class_name: String,
    /// Name of the invoked method.
    pub method_name: String,
    /// Configured delay of the step, if any.
    pub delay_millis: Option<i64>,
    pub status: InvocationStatus,
    /// Number of start attempts for this row (>= 1).
    pub attempts: u32,
    /// Serialized argument tuple. `None` only while a waiting row has not yet
    /// received its arguments from a resume.
    pub parameters: Option<Vec<u8>>,
    /// Serialized return value; present iff `status` is `Complete`.
    pub return_value: Option<Vec<u8>>,
}

impl Invocation {
    /// Whether this row is a top-level flow method invocation.
    pub fn is_flow(&self) -> bool {
        self.step == 0
    }

    /// The configured delay as a duration, if any.
    pub fn delay(&self) -> Option<std::time::Duration> {
        self.delay_millis
            .and_then(|ms| u64::try_from(ms).ok())
            .map(std::time::Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
