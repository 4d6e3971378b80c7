//! # Domain Layer - Metadata
//!
//! - `cache`: stored metas and profiles, keyed by address
//! - `query_history`: per-key refetch suppression window
//! - `config`: `MetadataConfig`
//! - `errors`: `MetadataError`

pub mod cache;
pub mod config;
pub mod errors;
pub mod query_history;

pub use cache::DocumentCache;
pub use config::MetadataConfig;
pub use errors::MetadataError;
pub use query_history::QueryHistory;
