//! # Render Pipeline (dw-04)
//!
//! Consumes messages (fresh from a channel response or drained from the
//! pending queue), verifies them against sender metas and renders the
//! verified ones into the page document through the template engine.
//!
//! ## Triggers
//!
//! | Trigger | Action |
//! |---------|--------|
//! | Page load | drain all, show; refresh every element kind |
//! | `/channel/{id}.js`, `/dwitter/{id}.js` | suspend arrivals, drain all, show; refresh links, nicknames |
//! | `/profile/{id}.js` | refresh links, nicknames |
//! | `MetaReceived(id)` | drain that sender, show; refresh links, nicknames |
//! | `ProfileReceived(id)` | refresh avatars, links, nicknames |
//!
//! ## Invariants
//!
//! - Verified markup is appended to its container, never replacing it.
//! - A message failing verification is dropped and never re-queued.
//! - A message waiting on its sender's meta is never rendered.

pub mod adapters;
pub mod domain;
pub mod refresh;
pub mod service;

pub use adapters::RenderBusAdapter;
pub use domain::{Document, Element, Node, PermalinkScheme, RenderError};
pub use service::{RenderConfig, RenderPipeline, ShowReport, Verdict};
