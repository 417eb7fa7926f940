//! Shared domain types for Duraflow.
//!
//! This crate contains the types that describe a durable flow to the rest of
//! the engine: the persisted `Invocation` record, the `MethodRef` descriptor
//! that identifies flow and step methods, and the error types of the storage
//! and serialization layers.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod error;
pub mod invocation;
pub mod method;

pub use error::{CodecError, StoreError};
pub use invocation::{Invocation, InvocationStatus};
pub use method::{MethodKind, MethodRef, StepDelay, TimeUnit};
