//! # Page Runtime Library
//!
//! This library exposes the page wiring and the script event loop for
//! testing. The main entry point is the `main.rs` binary.
//!
//! ## Architectural Patterns
//!
//! - **EDA**: subsystems react to responses published on the predicate bus
//!   and to notifications, never to each other directly
//! - **Hexagonal Architecture**: the script loader is a port; the file mirror
//!   and in-memory loaders are adapters
//! - **Run to completion**: one response and its notifications are fully
//!   handled before the next response is taken

pub mod container;
pub mod event_loop;
pub mod page;

pub use container::{ConfigError, PageConfig, ServiceProvider};
pub use event_loop::{
    Dispatcher, EventLoop, FileScriptLoader, LoadError, LoopCommand, LoopRequester,
    MemoryScriptLoader, ScriptLoader,
};
pub use page::{Page, PageError};
