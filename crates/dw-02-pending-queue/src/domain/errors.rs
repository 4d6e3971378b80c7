//! Pending queue errors.

use thiserror::Error;

/// Errors raised when configuring a queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `max_len` must leave room for at least one message.
    #[error("pending queue max_len must be positive")]
    ZeroCapacity,

    /// Unknown duplicate policy name.
    #[error("unknown duplicate policy: {0}")]
    UnknownPolicy(String),
}
