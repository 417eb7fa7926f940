//! Error types of the storage and serialization layers.

use thiserror::Error;

/// Errors from the execution log store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store failed to read or write.
    #[error("execution log I/O error: {0}")]
    Io(String),

    /// The addressed invocation row does not exist.
    #[error("invocation not found")]
    NotFound,

    /// A persisted row could not be mapped back into an `Invocation`.
    #[error("corrupt execution log row: {0}")]
    Corrupt(String),
}

/// Errors from encoding or decoding persisted parameters and return values.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode value: {0}")]
    Encode(String),

    #[error("failed to decode value: {0}")]
    Decode(String),
}
