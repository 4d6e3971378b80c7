//! # Subscriptions
//!
//! Defines the subscription side of the predicate bus: the matcher and
//! handler types and the errors raised while registering or dispatching.

use shared_types::{DecodeError, Payload, Request};
use std::sync::Arc;
use thiserror::Error;

/// Predicate over the request descriptor of a completed load.
pub type Matcher = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Callback invoked with the decoded payload of a matching load.
pub type Handler = Arc<dyn Fn(&Payload, &Request) -> Result<(), HandlerError> + Send + Sync>;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The same (matcher, handler) pair is already registered.
    #[error("Duplicate subscription")]
    Duplicate,

    /// The notification center was closed.
    #[error("Notification center closed")]
    Closed,
}

/// Errors a handler may report back to the bus.
///
/// The bus logs them and keeps dispatching to later subscribers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The payload did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The handler refused the payload.
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// A registered (matcher, handler) pair.
///
/// Two subscriptions are the same when both halves are the same allocation;
/// the closures' behaviour is never compared.
#[derive(Clone)]
pub struct Subscription {
    matcher: Matcher,
    handler: Handler,
}

impl Subscription {
    /// Pair a matcher with a handler.
    pub fn new(matcher: Matcher, handler: Handler) -> Self {
        Self { matcher, handler }
    }

    /// True if this subscription holds exactly these two references.
    pub fn is(&self, matcher: &Matcher, handler: &Handler) -> bool {
        same_allocation(&self.matcher, matcher) && same_allocation(&self.handler, handler)
    }

    /// Evaluate the matcher.
    pub fn matches(&self, request: &Request) -> bool {
        (self.matcher)(request)
    }

    /// Invoke the handler.
    pub fn call(&self, payload: &Payload, request: &Request) -> Result<(), HandlerError> {
        (self.handler)(payload, request)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("matcher", &Arc::as_ptr(&self.matcher).cast::<()>())
            .field("handler", &Arc::as_ptr(&self.handler).cast::<()>())
            .finish()
    }
}

// Data pointers only: vtable addresses are not stable across codegen units.
fn same_allocation<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
