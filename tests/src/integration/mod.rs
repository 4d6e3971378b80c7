//! Cross-subsystem integration tests.

pub mod flows;
pub mod site_mirror;
