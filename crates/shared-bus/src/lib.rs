//! # Shared Bus - Response Dispatch for the Page Subsystems
//!
//! Every script response loaded by the page is published here together with
//! its request descriptor. Subsystems never call each other on arrival; they
//! register predicates over the request path and react to what matches.
//!
//! ```text
//! ┌──────────────┐   publish(payload, request)   ┌──────────────┐
//! │ Script Loader│ ─────────────────────────────▶│ PredicateBus │
//! └──────────────┘                               └──────┬───────┘
//!                              matcher(request)?        │
//!              ┌───────────────────┬────────────────────┤
//!              ▼                   ▼                    ▼
//!        Meta cache          Pending queue         Link refresh
//!              │
//!              ▼ post(MetaReceived)
//!      ┌────────────────────┐
//!      │ NotificationCenter │ ──▶ Render pipeline (drain sender)
//!      └────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Registration order**: one publish calls matching handlers in the
//!   order they were subscribed, each exactly once.
//! - **Reference identity**: a subscription is the pair of matcher and
//!   handler allocations; duplicates are refused with an error.
//! - **Isolation**: a failing handler is logged and does not stop dispatch.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod notifications;
pub mod publisher;
pub mod routes;
pub mod subscriber;

// Re-export main types
pub use notifications::{
    Notification, NotificationCenter, NotificationFilter, NotificationSubscription,
    NotificationTopic,
};
pub use publisher::{DispatchReport, PredicateBus};
pub use routes::Route;
pub use subscriber::{Handler, HandlerError, Matcher, Subscription, SubscriptionError};

/// Maximum notifications to buffer per receiver before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
