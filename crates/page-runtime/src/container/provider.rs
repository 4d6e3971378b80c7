//! Service-provider document (`gsp.json`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::config::ConfigError;

/// A relay station run by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "ID")]
    pub id: String,
    pub host: String,
    pub port: u16,
}

/// The service provider operating the relay web server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProvider {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(default)]
    pub founder: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub assistants: Vec<String>,
    #[serde(default)]
    pub archivists: Vec<String>,
    /// Named URL templates with `{var}` tokens.
    #[serde(rename = "APIs", default)]
    pub apis: BTreeMap<String, String>,
}

impl ServiceProvider {
    /// Read and parse a provider document.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::provider_io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ConfigError::provider_format(path, e))
    }

    /// Expand the `name` API template. Unknown tokens are left in place.
    pub fn api_url(&self, name: &str, vars: &[(&str, &str)]) -> Option<String> {
        let mut url = self.apis.get(name)?.clone();
        for (key, value) in vars {
            url = url.replace(&format!("{{{key}}}"), value);
        }
        Some(url)
    }
}
