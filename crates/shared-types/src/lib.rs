//! # Shared Types Crate
//!
//! This crate contains the wire documents exchanged with the relay web server
//! (messages, channels, meta, profiles), the request descriptor handed to bus
//! subscribers, and the messaging-library port.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Injected SDK**: The messaging library is reached only through a
//!   `LibrarySlot` passed at construction time.

pub mod entities;
pub mod errors;
pub mod library;

pub use entities::*;
pub use errors::*;
pub use library::{LibrarySlot, MessagingLibrary};
