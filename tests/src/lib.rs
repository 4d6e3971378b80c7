//! # Dwitter Page Test Suite
//!
//! Unified test crate for flows that cross subsystem boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs        # channel → meta → render through the event loop
//!     └── site_mirror.rs  # the binary's file-backed loader and page markup
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dw-tests
//! cargo test -p dw-tests integration::flows
//! ```

pub mod integration;
