//! Method descriptors: the metadata contract for flow and step methods.
//!
//! Rust has no runtime annotations, so a workflow type declares one
//! [`MethodRef`] constant per durable method and passes it at the proxy call
//! site. The descriptor carries everything the interceptor needs: the
//! declaring type's name, the method name, whether it is a flow or a step,
//! and the step's optional delay.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TimeUnit / StepDelay
// ---------------------------------------------------------------------------

/// Unit of a configured step delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Nanos,
    Micros,
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
}

/// A step delay: `amount * unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDelay {
    pub amount: u64,
    pub unit: TimeUnit,
}

impl StepDelay {
    pub const fn new(amount: u64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    /// The delay as a duration.
    pub fn duration(&self) -> Duration {
        match self.unit {
            TimeUnit::Nanos => Duration::from_nanos(self.amount),
            TimeUnit::Micros => Duration::from_micros(self.amount),
            TimeUnit::Millis => Duration::from_millis(self.amount),
            TimeUnit::Seconds => Duration::from_secs(self.amount),
            TimeUnit::Minutes => Duration::from_secs(self.amount * 60),
            TimeUnit::Hours => Duration::from_secs(self.amount * 3_600),
            TimeUnit::Days => Duration::from_secs(self.amount * 86_400),
        }
    }

    /// The delay in whole milliseconds, as persisted in the log.
    pub fn as_millis(&self) -> i64 {
        self.duration().as_millis() as i64
    }
}

// ---------------------------------------------------------------------------
// MethodKind / MethodRef
// ---------------------------------------------------------------------------

/// Whether a durable method is the top-level flow or one of its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Flow,
    Step { delay: Option<StepDelay> },
}

/// Identity and metadata of an intercepted method.
///
/// Declared as associated constants on the workflow type:
///
/// ```
/// use duraflow_types::{MethodRef, TimeUnit};
///
/// struct Signup;
///
/// impl Signup {
///     const SIGNUP_USER: MethodRef = MethodRef::flow("Signup", "signup_user");
///     const REMIND: MethodRef =
///         MethodRef::step("Signup", "remind").with_delay(1, TimeUnit::Hours);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRef {
    pub class_name: &'static str,
    pub method_name: &'static str,
    pub kind: MethodKind,
}

impl MethodRef {
    /// Descriptor for a top-level flow method.
    pub const fn flow(class_name: &'static str, method_name: &'static str) -> Self {
        Self {
            class_name,
            method_name,
            kind: MethodKind::Flow,
        }
    }

    /// Descriptor for a step method without a delay.
    pub const fn step(class_name: &'static str, method_name: &'static str) -> Self {
        Self {
            class_name,
            method_name,
            kind: MethodKind::Step { delay: None },
        }
    }

    /// Attach a delay to a step descriptor. The default unit convention of
    /// the metadata contract is seconds; pass the unit explicitly here.
    pub const fn with_delay(self, amount: u64, unit: TimeUnit) -> Self {
        Self {
            class_name: self.class_name,
            method_name: self.method_name,
            kind: MethodKind::Step {
                delay: Some(StepDelay::new(amount, unit)),
            },
        }
    }

    pub fn is_flow(&self) -> bool {
        matches!(self.kind, MethodKind::Flow)
    }

    /// The configured delay, if this is a delayed step.
    pub fn delay(&self) -> Option<StepDelay> {
        match self.kind {
            MethodKind::Step { delay } => delay,
            MethodKind::Flow => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
