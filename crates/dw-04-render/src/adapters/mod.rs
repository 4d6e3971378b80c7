//! # Adapters Layer
//!
//! - `bus`: channel and profile arrivals on the predicate bus

pub mod bus;

pub use bus::RenderBusAdapter;
