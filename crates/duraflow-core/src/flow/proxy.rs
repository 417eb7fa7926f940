//! The flow proxy: the call site that routes durable methods into the
//! interceptor.
//!
//! Rust has no dynamic subclassing, so interception is explicit: a durable
//! method is an ordinary async fn that wraps its body in
//! [`FlowProxy::call`], passing the method's [`MethodRef`] descriptor and
//! argument tuple. Methods that are neither flow nor step are plain method
//! calls on [`FlowProxy::state`] and never touch the log.

use std::sync::Arc;

use duraflow_types::MethodRef;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::FlowError;
use crate::flow::interceptor::Interceptor;
use crate::repository::ExecutionLog;

struct ProxyInner<T, L> {
    state: T,
    interceptor: Interceptor<L>,
}

/// Cheaply cloneable handle to one flow instance: the user value plus its
/// interception state. Clones share the step counter, so a proxy must not be
/// used by two concurrent runs of the same flow.
pub struct FlowProxy<T, L> {
    inner: Arc<ProxyInner<T, L>>,
}

impl<T, L> Clone for FlowProxy<T, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, L: ExecutionLog> FlowProxy<T, L> {
    pub(crate) fn new(state: T, interceptor: Interceptor<L>) -> Self {
        Self {
            inner: Arc::new(ProxyInner { state, interceptor }),
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.inner.interceptor.flow_id()
    }

    /// The user value, for passthrough method calls.
    pub fn state(&self) -> &T {
        &self.inner.state
    }

    /// Route an intercepted invocation.
    ///
    /// `body` is the original method body; it receives a clone of this proxy
    /// (for nested step calls and state access) and the argument tuple,
    /// which the interceptor may have substituted with resume-delivered
    /// arguments. Depending on the log and the call mode the body may not be
    /// invoked at all.
    pub async fn call<A, R, F, Fut>(
        &self,
        method: &MethodRef,
        args: A,
        body: F,
    ) -> Result<R, FlowError>
    where
        A: Serialize + DeserializeOwned + Send,
        R: Serialize + DeserializeOwned,
        F: FnOnce(FlowProxy<T, L>, A) -> Fut,
        Fut: Future<Output = Result<R, FlowError>>,
    {
        let proxy = self.clone();
        self.inner
            .interceptor
            .intercept(method, args, move |args| body(proxy, args))
            .await
    }
}
