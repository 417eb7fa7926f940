//! Flow execution: the interceptor state machine and its user-facing shell.
//!
//! - `interceptor` -- decides replay / execute / sleep / wait / resume per
//!   intercepted call and keeps the execution log consistent
//! - `proxy` -- the call-site object that routes method calls into the
//!   interceptor
//! - `handle` -- run / execute / resume entry points and `await_signal`
//! - `registry` -- class-name dispatch used by crash recovery

pub mod handle;
pub mod interceptor;
pub mod proxy;
pub mod registry;

pub use handle::{FlowHandle, await_signal};
pub use interceptor::Interceptor;
pub use proxy::FlowProxy;
pub use registry::FlowRegistry;

/// A workflow type whose durable methods are routed through a [`FlowProxy`].
///
/// `NAME` is the class identity recorded in the execution log and must match
/// the `class_name` of the type's `MethodRef` constants. `restore` is the
/// no-argument constructor the engine uses whenever a flow is entered by id,
/// including crash recovery.
pub trait Flow: Send + Sync + 'static {
    const NAME: &'static str;

    fn restore() -> Self;
}
