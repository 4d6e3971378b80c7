//! # Predicate Bus
//!
//! Defines the publishing side of the bus. Subscribers are keyed by a
//! predicate over the request, not by a topic string, so one response can
//! fan out to several unrelated concerns.

use crate::subscriber::{Handler, Matcher, Subscription, SubscriptionError};
use parking_lot::RwLock;
use shared_types::{Payload, Request};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, warn};

/// Outcome of one `publish` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Subscribers whose matcher accepted the request.
    pub matched: usize,
    /// Matched subscribers whose handler returned an error.
    pub failed: usize,
}

/// In-memory predicate bus.
///
/// Dispatch runs synchronously, in registration order, over a snapshot of
/// the subscription list taken when `publish` starts. Handlers may
/// subscribe or unsubscribe without deadlocking; such changes apply to the
/// next publish.
pub struct PredicateBus {
    /// Registered subscriptions in insertion order.
    subscriptions: RwLock<Vec<Subscription>>,

    /// Total payloads published.
    events_published: AtomicU64,
}

impl PredicateBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            events_published: AtomicU64::new(0),
        }
    }

    /// Register a (matcher, handler) pair.
    ///
    /// # Errors
    ///
    /// `SubscriptionError::Duplicate` if the exact pair is already registered;
    /// the list is left unchanged.
    pub fn subscribe(&self, matcher: Matcher, handler: Handler) -> Result<(), SubscriptionError> {
        let mut subs = self.subscriptions.write();
        if subs.iter().any(|s| s.is(&matcher, &handler)) {
            error!("duplicate observer");
            return Err(SubscriptionError::Duplicate);
        }
        subs.push(Subscription::new(matcher, handler));
        debug!(subscribers = subs.len(), "Subscription added");
        Ok(())
    }

    /// Remove every registration of the pair. Returns how many were removed.
    pub fn unsubscribe(&self, matcher: &Matcher, handler: &Handler) -> usize {
        let mut subs = self.subscriptions.write();
        let before = subs.len();
        subs.retain(|s| !s.is(matcher, handler));
        let removed = before - subs.len();
        debug!(removed, subscribers = subs.len(), "Subscription removed");
        removed
    }

    /// Deliver `payload` to every subscriber whose matcher accepts `request`.
    pub fn publish(&self, payload: &Payload, request: &Request) -> DispatchReport {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        let snapshot: Vec<Subscription> = self.subscriptions.read().clone();

        let mut report = DispatchReport::default();
        for sub in snapshot.iter().filter(|s| s.matches(request)) {
            report.matched += 1;
            if let Err(e) = sub.call(payload, request) {
                report.failed += 1;
                warn!(path = %request.path, error = %e, "Subscriber failed");
            }
        }

        debug!(
            path = %request.path,
            matched = report.matched,
            failed = report.failed,
            "Payload published"
        );
        report
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Total number of `publish` calls.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for PredicateBus {
    fn default() -> Self {
        Self::new()
    }
}
