//! # Page Configuration
//!
//! Unified configuration for the page subsystems and the script loader.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DW_BASE_URL` | `base_url` |
//! | `DW_SITE_DIR` | `site_dir` |
//! | `DW_GSP_CONFIG` | `gsp_config` |
//! | `DW_DEBOUNCE_SECS` | `debounce_secs` |
//! | `DW_PERMALINK` | `permalink` (`message` or `dated`) |
//! | `DW_PENDING_DEDUP` | `duplicates` (`keep` or `drop_by_signature`) |
//!
//! Unparseable values are logged and the previous value is kept.

use std::path::{Path, PathBuf};

use dw_02_pending_queue::{DuplicatePolicy, QueueConfig, QueueError};
use dw_03_metadata::{MetadataConfig, QueryHistory};
use dw_04_render::{PermalinkScheme, RenderConfig};
use shared_types::script_url;
use thiserror::Error;
use tracing::{info, warn};

use super::provider::ServiceProvider;

/// Default base URL of the relay web server.
pub const DEFAULT_BASE_URL: &str = "/";

/// Complete page configuration.
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Base URL every script URL is built from.
    pub base_url: String,
    /// Local mirror of the relay responses; also holds `index.html`.
    pub site_dir: PathBuf,
    /// Optional service-provider document.
    pub gsp_config: Option<PathBuf>,
    /// Refetch window for meta and profile queries.
    pub debounce_secs: u64,
    /// Permalink scheme of rendered messages.
    pub permalink: PermalinkScheme,
    /// Pending-queue duplicate policy.
    pub duplicates: DuplicatePolicy,
    /// Pending-queue bound. When full, the oldest waiting message is
    /// evicted and logged; it is not rendered later.
    pub max_pending: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_dir: PathBuf::from("site"),
            gsp_config: None,
            debounce_secs: QueryHistory::DEFAULT_WINDOW,
            permalink: PermalinkScheme::default(),
            duplicates: DuplicatePolicy::default(),
            max_pending: QueueConfig::default().max_len,
        }
    }
}

impl PageConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `DW_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DW_BASE_URL") {
            self.base_url = url;
        }
        if let Some(dir) = lookup("DW_SITE_DIR") {
            self.site_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("DW_GSP_CONFIG") {
            self.gsp_config = Some(PathBuf::from(path));
        }
        if let Some(secs) = lookup("DW_DEBOUNCE_SECS") {
            match secs.parse() {
                Ok(s) => self.debounce_secs = s,
                Err(_) => warn!(value = %secs, "DW_DEBOUNCE_SECS must be a number of seconds"),
            }
        }
        if let Some(scheme) = lookup("DW_PERMALINK") {
            match scheme.parse() {
                Ok(s) => self.permalink = s,
                Err(e) => warn!(value = %scheme, error = %e, "Ignoring DW_PERMALINK"),
            }
        }
        if let Some(policy) = lookup("DW_PENDING_DEDUP") {
            match policy.parse() {
                Ok(p) => self.duplicates = p,
                Err(e) => warn!(value = %policy, error = %e, "Ignoring DW_PENDING_DEDUP"),
            }
        }
    }

    /// Take the provider URL as base URL unless one was configured.
    pub fn apply_provider(&mut self, provider: &ServiceProvider) {
        if self.base_url == DEFAULT_BASE_URL && !provider.url.is_empty() {
            info!(provider = %provider.name, url = %provider.url, "Using provider base URL");
            self.base_url = provider.url.clone();
        }
    }

    /// Check the configuration before the page starts.
    ///
    /// # Errors
    ///
    /// - `InvalidBaseUrl` unless the base URL is a path, a protocol-relative
    ///   URL or an http(s) URL
    /// - `ZeroDebounce` if the refetch window is zero
    /// - `Queue` if the pending-queue settings are invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        match script_url(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBaseUrl(self.base_url.clone())),
        }
        if self.debounce_secs == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        self.queue().validate()?;
        Ok(())
    }

    /// Check that the site mirror is present.
    pub fn validate_site(&self) -> Result<(), ConfigError> {
        if self.site_dir.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::MissingSiteDir(self.site_dir.clone()))
        }
    }

    /// Path of the page markup inside the site mirror.
    pub fn index_path(&self) -> PathBuf {
        self.site_dir.join("index.html")
    }

    /// Pending-queue settings.
    pub fn queue(&self) -> QueueConfig {
        QueueConfig {
            max_len: self.max_pending,
            duplicates: self.duplicates,
        }
    }

    /// Metadata cache settings.
    pub fn metadata(&self) -> MetadataConfig {
        MetadataConfig {
            base_url: self.base_url.clone(),
            debounce_secs: self.debounce_secs,
        }
    }

    /// Render pipeline settings.
    pub fn render(&self) -> RenderConfig {
        RenderConfig {
            base_url: self.base_url.clone(),
            permalink: self.permalink,
            queue: self.queue(),
            ..RenderConfig::default()
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Base URL is neither a path nor an http(s) URL.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Refetch window of zero seconds.
    #[error("DW_DEBOUNCE_SECS must be greater than zero")]
    ZeroDebounce,

    /// Pending-queue settings rejected.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Site mirror directory does not exist.
    #[error("Site directory not found: {}", .0.display())]
    MissingSiteDir(PathBuf),

    /// Provider document could not be read.
    #[error("Cannot read provider config {}: {source}", path.display())]
    ProviderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Provider document is not valid JSON of the expected shape.
    #[error("Malformed provider config {}: {source}", path.display())]
    ProviderFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn provider_io(path: &Path, source: std::io::Error) -> Self {
        Self::ProviderIo {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn provider_format(path: &Path, source: serde_json::Error) -> Self {
        Self::ProviderFormat {
            path: path.to_path_buf(),
            source,
        }
    }
}
