//! # Page Container
//!
//! Configuration and provider settings the page is started with.

pub mod config;
pub mod provider;

pub use config::{ConfigError, PageConfig, DEFAULT_BASE_URL};
pub use provider::{ServiceProvider, Station};
