//! # Domain Layer - Render
//!
//! - `document`: element tree of the page
//! - `permalink`: message link schemes
//! - `errors`: `RenderError`

pub mod document;
pub mod errors;
pub mod permalink;

pub use document::{parse_fragment, Document, Element, Node};
pub use errors::RenderError;
pub use permalink::{dated_link, filename, PermalinkScheme};
