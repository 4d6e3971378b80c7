//! # Ports Layer
//!
//! - `inbound`: `MetadataApi`, what the render pipeline calls
//! - `outbound`: `ScriptRequester`, `TimeSource`

pub mod inbound;
pub mod outbound;

pub use inbound::MetadataApi;
pub use outbound::{ScriptRequester, TimeSource};
