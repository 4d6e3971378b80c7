//! # Domain Layer - Pending Queue
//!
//! - `entities`: `QueueConfig`, `DuplicatePolicy`
//! - `queue`: `PendingQueue`
//! - `errors`: `QueueError`

pub mod entities;
pub mod errors;
pub mod queue;

pub use entities::*;
pub use errors::*;
pub use queue::*;
