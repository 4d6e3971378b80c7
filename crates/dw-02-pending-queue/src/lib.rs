//! # Pending Queue (dw-02)
//!
//! Holds messages whose authenticity cannot be established yet because the
//! sender's meta has not arrived. The render pipeline drains it either per
//! sender (when that sender's meta arrives) or wholesale (page load, channel
//! arrival).
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Relative order kept per drain | `drain` filters in one forward pass |
//! | Bounded length | oldest entry evicted past `max_len` |
//! | One copy per signature | `DuplicatePolicy::DropBySignature` (default) |

pub mod domain;

pub use domain::{DuplicatePolicy, EnqueueOutcome, PendingQueue, QueueConfig, QueueError};
