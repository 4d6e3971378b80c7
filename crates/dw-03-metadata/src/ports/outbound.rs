//! # Outbound Ports (Driven Ports)
//!
//! What the metadata service needs from its host.

use shared_types::FetchTicket;

/// Issues script fetches. The response comes back later through the bus.
pub trait ScriptRequester: Send + Sync {
    /// Queue a fetch of `url`.
    fn request(&self, url: &str) -> FetchTicket;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in seconds since epoch.
    fn now(&self) -> u64;
}
