//! Queue configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::QueueError;

/// What to do when a message is enqueued twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep every delivery, duplicates included.
    Keep,
    /// Ignore a message whose signature is already queued.
    #[default]
    DropBySignature,
}

impl FromStr for DuplicatePolicy {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "drop_by_signature" | "drop" | "signature" => Ok(Self::DropBySignature),
            other => Err(QueueError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Pending queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of queued messages. Enqueueing at the bound evicts
    /// the oldest message ([`EnqueueOutcome::Evicted`](super::EnqueueOutcome)).
    pub max_len: usize,
    /// Duplicate handling.
    pub duplicates: DuplicatePolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_len: 4096,
            duplicates: DuplicatePolicy::DropBySignature,
        }
    }
}

impl QueueConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.max_len == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(())
    }
}
