//! # Notification Center
//!
//! Secondary notifications emitted after a document has been stored, so that
//! renderers waiting on it can retry. Delivery goes through a
//! `tokio::sync::broadcast` channel; receivers are polled by the page after
//! each bus dispatch, never from inside one.

use crate::subscriber::SubscriptionError;
use crate::DEFAULT_CHANNEL_CAPACITY;
use shared_types::Identity;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Notifications posted by the document caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Meta for `identity` was received and stored.
    MetaReceived { identity: Identity },

    /// Profile for `identity` was received and stored.
    ProfileReceived { identity: Identity },
}

impl Notification {
    /// The topic this notification belongs to.
    #[must_use]
    pub fn topic(&self) -> NotificationTopic {
        match self {
            Notification::MetaReceived { .. } => NotificationTopic::Meta,
            Notification::ProfileReceived { .. } => NotificationTopic::Profile,
        }
    }

    /// The identity the notification is about.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        match self {
            Notification::MetaReceived { identity } | Notification::ProfileReceived { identity } => {
                identity
            }
        }
    }
}

/// Notification topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTopic {
    /// Meta documents.
    Meta,
    /// Profile documents.
    Profile,
}

/// Topic filter for a notification subscription. Empty means all topics.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    /// Accepted topics.
    pub topics: Vec<NotificationTopic>,
}

impl NotificationFilter {
    /// Accept every notification.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Accept only the listed topics.
    #[must_use]
    pub fn topics(topics: Vec<NotificationTopic>) -> Self {
        Self { topics }
    }

    /// True if `notification` passes the filter.
    #[must_use]
    pub fn matches(&self, notification: &Notification) -> bool {
        self.topics.is_empty() || self.topics.contains(&notification.topic())
    }
}

/// Broadcast hub for `Notification`s.
pub struct NotificationCenter {
    sender: broadcast::Sender<Notification>,
    posted: AtomicU64,
    capacity: usize,
}

impl NotificationCenter {
    /// Create a center with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a center buffering up to `capacity` notifications per receiver.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            posted: AtomicU64::new(0),
            capacity,
        }
    }

    /// Post a notification. Returns the number of receivers reached.
    pub fn post(&self, notification: Notification) -> usize {
        self.posted.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(notification) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(dropped)) => {
                debug!(notification = ?dropped, "Notification dropped (no receivers)");
                0
            }
        }
    }

    /// Subscribe to notifications matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: NotificationFilter) -> NotificationSubscription {
        debug!(topics = ?filter.topics, "Notification subscription created");
        NotificationSubscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total notifications posted.
    #[must_use]
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving handle for notifications.
pub struct NotificationSubscription {
    receiver: broadcast::Receiver<Notification>,
    filter: NotificationFilter,
}

impl NotificationSubscription {
    /// Wait for the next matching notification. `None` once the center is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            let notification = match self.receiver.recv().await {
                Ok(n) => n,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some notifications dropped");
                    continue;
                }
            };
            if self.filter.matches(&notification) {
                return Some(notification);
            }
        }
    }

    /// Take the next matching notification without waiting.
    ///
    /// # Errors
    ///
    /// `SubscriptionError::Closed` once the center is gone.
    pub fn try_recv(&mut self) -> Result<Option<Notification>, SubscriptionError> {
        loop {
            let notification = match self.receiver.try_recv() {
                Ok(n) => n,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };
            if self.filter.matches(&notification) {
                return Ok(Some(notification));
            }
        }
    }

    /// Drain every pending matching notification.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(Some(n)) = self.try_recv() {
            out.push(n);
        }
        out
    }

    /// The filter of this subscription.
    #[must_use]
    pub fn filter(&self) -> &NotificationFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn moky() -> Identity {
        "moky@abc".parse().unwrap()
    }

    #[test]
    fn test_post_without_receivers() {
        let center = NotificationCenter::new();
        let reached = center.post(Notification::MetaReceived { identity: moky() });
        assert_eq!(reached, 0);
        assert_eq!(center.posted(), 1);
    }

    #[test]
    fn test_filter_by_topic() {
        let center = NotificationCenter::new();
        let mut metas = center.subscribe(NotificationFilter::topics(vec![NotificationTopic::Meta]));

        center.post(Notification::ProfileReceived { identity: moky() });
        center.post(Notification::MetaReceived { identity: moky() });

        let got = metas.drain();
        assert_eq!(got, vec![Notification::MetaReceived { identity: moky() }]);
        assert!(matches!(metas.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_recv_waits_for_notification() {
        let center = NotificationCenter::new();
        let mut sub = center.subscribe(NotificationFilter::all());
        assert_eq!(center.subscriber_count(), 1);

        center.post(Notification::ProfileReceived { identity: moky() });

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("notification");
        assert_eq!(received.identity(), &moky());
        assert_eq!(received.topic(), NotificationTopic::Profile);
    }

    #[test]
    fn test_closed_center() {
        let center = NotificationCenter::with_capacity(4);
        assert_eq!(center.capacity(), 4);
        let mut sub = center.subscribe(NotificationFilter::all());
        drop(center);
        assert_eq!(sub.try_recv(), Err(SubscriptionError::Closed));
    }
}
