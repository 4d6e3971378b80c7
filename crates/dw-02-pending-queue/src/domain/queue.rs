//! # Pending Queue
//!
//! FIFO of raw messages awaiting sender meta.

use shared_types::Message;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

use super::entities::{DuplicatePolicy, QueueConfig};

/// Result of [`PendingQueue::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Appended.
    Queued,
    /// Ignored: same signature already queued.
    Duplicate,
    /// Appended after evicting the oldest entry.
    Evicted(Box<Message>),
}

/// Messages waiting for their sender's meta.
#[derive(Debug)]
pub struct PendingQueue {
    config: QueueConfig,
    messages: VecDeque<Message>,
    signatures: HashSet<String>,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl PendingQueue {
    /// Create an empty queue. A zero `max_len` is raised to one.
    pub fn new(mut config: QueueConfig) -> Self {
        config.max_len = config.max_len.max(1);
        Self {
            config,
            messages: VecDeque::new(),
            signatures: HashSet::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message.
    pub fn enqueue(&mut self, message: Message) -> EnqueueOutcome {
        if self.config.duplicates == DuplicatePolicy::DropBySignature
            && self.signatures.contains(&message.signature)
        {
            debug!(sender = %message.sender, "Duplicate pending message ignored");
            return EnqueueOutcome::Duplicate;
        }

        let evicted = if self.messages.len() >= self.config.max_len {
            self.messages.pop_front().map(|old| {
                warn!(
                    sender = %old.sender,
                    max_len = self.config.max_len,
                    "Pending queue full, evicting oldest message"
                );
                self.forget(&old);
                old
            })
        } else {
            None
        };

        debug!(sender = %message.sender, queued = self.messages.len() + 1, "Message suspended");
        self.signatures.insert(message.signature.clone());
        self.messages.push_back(message);

        match evicted {
            Some(old) => EnqueueOutcome::Evicted(Box::new(old)),
            None => EnqueueOutcome::Queued,
        }
    }

    /// Remove and return messages.
    ///
    /// With `Some(sender)` only that sender's messages leave the queue, in
    /// their original relative order. With `None` the queue is emptied.
    pub fn drain(&mut self, sender: Option<&str>) -> Vec<Message> {
        match sender {
            Some(sender) => self.drain_where(|m| m.sender == sender),
            None => {
                self.signatures.clear();
                self.messages.drain(..).collect()
            }
        }
    }

    /// Remove and return every message accepted by `pred`, keeping order.
    pub fn drain_where<F>(&mut self, mut pred: F) -> Vec<Message>
    where
        F: FnMut(&Message) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.messages.len());
        for message in self.messages.drain(..) {
            if pred(&message) {
                taken.push(message);
            } else {
                kept.push_back(message);
            }
        }
        self.messages = kept;
        for message in &taken {
            self.signatures.remove(&message.signature);
        }
        taken
    }

    /// Copy messages without removing them.
    pub fn peek(&self, sender: Option<&str>) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| sender.map_or(true, |s| m.sender == s))
            .cloned()
            .collect()
    }

    fn forget(&mut self, message: &Message) {
        // Under `Keep` another copy may still be queued.
        if !self.messages.iter().any(|m| m.signature == message.signature) {
            self.signatures.remove(&message.signature);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msg(sender: &str, sig: &str) -> Message {
        Message {
            sender: sender.to_string(),
            data: String::new(),
            signature: sig.to_string(),
            time: 0,
            title: None,
            link: None,
        }
    }

    fn sigs(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.signature.as_str()).collect()
    }

    #[test]
    fn test_drain_by_sender_then_all() {
        let mut queue = PendingQueue::default();
        queue.enqueue(msg("A", "a1"));
        queue.enqueue(msg("B", "b1"));
        queue.enqueue(msg("A", "a2"));

        let a = queue.drain(Some("A"));
        assert_eq!(sigs(&a), vec!["a1", "a2"]);
        assert_eq!(sigs(&queue.peek(None)), vec!["b1"]);

        let rest = queue.drain(None);
        assert_eq!(sigs(&rest), vec!["b1"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_unknown_sender_is_empty() {
        let mut queue = PendingQueue::default();
        queue.enqueue(msg("A", "a1"));
        assert!(queue.drain(Some("Z")).is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_peek_leaves_queue() {
        let mut queue = PendingQueue::default();
        queue.enqueue(msg("A", "a1"));
        queue.enqueue(msg("B", "b1"));
        assert_eq!(sigs(&queue.peek(Some("B"))), vec!["b1"]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_duplicates_dropped_by_default() {
        let mut queue = PendingQueue::default();
        assert_eq!(queue.enqueue(msg("A", "a1")), EnqueueOutcome::Queued);
        assert_eq!(queue.enqueue(msg("A", "a1")), EnqueueOutcome::Duplicate);
        assert_eq!(queue.len(), 1);

        // After draining the same message may be suspended again.
        queue.drain(Some("A"));
        assert_eq!(queue.enqueue(msg("A", "a1")), EnqueueOutcome::Queued);
    }

    #[test]
    fn test_keep_policy_keeps_duplicates() {
        let mut queue = PendingQueue::new(QueueConfig {
            duplicates: DuplicatePolicy::Keep,
            ..Default::default()
        });
        queue.enqueue(msg("A", "a1"));
        queue.enqueue(msg("A", "a1"));
        assert_eq!(queue.drain(None).len(), 2);
    }

    #[test]
    fn test_eviction_of_oldest() {
        let mut queue = PendingQueue::new(QueueConfig {
            max_len: 2,
            ..Default::default()
        });
        queue.enqueue(msg("A", "1"));
        queue.enqueue(msg("A", "2"));
        let outcome = queue.enqueue(msg("A", "3"));
        assert!(matches!(outcome, EnqueueOutcome::Evicted(m) if m.signature == "1"));
        assert_eq!(sigs(&queue.peek(None)), vec!["2", "3"]);
        // Evicted signature is no longer considered queued.
        assert_eq!(queue.enqueue(msg("A", "1")), EnqueueOutcome::Evicted(Box::new(msg("A", "2"))));
    }

    proptest! {
        #[test]
        fn prop_drain_partitions_in_order(senders in proptest::collection::vec(0u8..4, 0..40)) {
            let mut queue = PendingQueue::new(QueueConfig {
                duplicates: DuplicatePolicy::Keep,
                ..Default::default()
            });
            let all: Vec<Message> = senders
                .iter()
                .enumerate()
                .map(|(i, s)| msg(&format!("S{s}"), &i.to_string()))
                .collect();
            for m in &all {
                queue.enqueue(m.clone());
            }

            let taken = queue.drain(Some("S0"));
            let expected: Vec<Message> = all.iter().filter(|m| m.sender == "S0").cloned().collect();
            prop_assert_eq!(taken, expected);

            let rest = queue.drain(None);
            let expected: Vec<Message> = all.iter().filter(|m| m.sender != "S0").cloned().collect();
            prop_assert_eq!(rest, expected);
            prop_assert!(queue.is_empty());
        }
    }
}
