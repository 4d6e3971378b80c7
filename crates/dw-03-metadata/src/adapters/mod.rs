//! # Adapters Layer
//!
//! - `bus`: registers the response handlers on the predicate bus
//! - `time`: wall-clock `TimeSource`

pub mod bus;
pub mod time;

pub use bus::MetadataBusAdapter;
pub use time::SystemTimeSource;
