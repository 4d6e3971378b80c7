//! Metadata subsystem configuration.

use serde::{Deserialize, Serialize};

use super::query_history::QueryHistory;

/// Configuration for `MetadataService`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Site root that `meta/` and `profile/` are resolved against.
    pub base_url: String,
    /// Refetch suppression window per identity, in seconds.
    pub debounce_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            debounce_secs: QueryHistory::DEFAULT_WINDOW,
        }
    }
}

impl MetadataConfig {
    /// Config with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}
