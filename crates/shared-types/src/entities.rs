//! # Core Domain Entities
//!
//! Defines the wire documents that flow between the relay web server and the
//! page runtime.
//!
//! ## Clusters
//!
//! - **Identity**: `Identity`, `Request`, `FetchTicket`
//! - **Messages**: `Message`, `Content`, `ChannelDocument`
//! - **Documents**: `Meta`, `MetaKey`, `Profile`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use crate::errors::DecodeError;

/// A decoded JSON response body, as delivered by the script loader.
pub type Payload = serde_json::Value;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A user or station identity: `name@address`, or a bare `address`.
///
/// Any `/terminal` suffix is dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    name: Option<String>,
    address: String,
}

impl Identity {
    /// Create an identity from its parts.
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            address: address.into(),
        }
    }

    /// The name part (the meta seed), if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The address part.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Return a copy carrying `name`, keeping the address.
    #[must_use]
    pub fn with_name(&self, name: Option<String>) -> Self {
        Self::new(name, self.address.clone())
    }
}

impl FromStr for Identity {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = match s.find('/') {
            Some(pos) => &s[..pos],
            None => s,
        };
        let (name, address) = match s.find('@') {
            Some(pos) => (Some(s[..pos].to_string()), &s[pos + 1..]),
            None => (None, s),
        };
        let valid = !address.is_empty()
            && address
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DecodeError::InvalidIdentity(s.to_string()));
        }
        Ok(Self::new(name, address))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}@{}", name, self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// Correlation ticket attached to an issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTicket(pub Uuid);

impl FetchTicket {
    /// Allocate a fresh ticket.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FetchTicket {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor of a completed script load, handed to bus subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// URL path of the loaded script, e.g. `/meta/{address}.js`.
    pub path: String,
    /// Ticket of the fetch that produced this response, when known.
    pub ticket: Option<FetchTicket>,
}

impl Request {
    /// Request descriptor for a bare path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ticket: None,
        }
    }

    /// Build the descriptor for a full URL, keeping only its path
    /// (scheme, host, query and fragment are dropped).
    pub fn from_url(url: &str, ticket: Option<FetchTicket>) -> Self {
        Self::relative_to("/", url, ticket)
    }

    /// Build the descriptor for `url` with its path taken relative to
    /// `base_url` when `url` lies under it.
    pub fn relative_to(base_url: &str, url: &str, ticket: Option<FetchTicket>) -> Self {
        let path = match (script_url(base_url), script_url(url)) {
            (Ok(base), Ok(full)) => path_under(&base, &full),
            (Err(_), Ok(full)) => full.path().to_string(),
            (_, Err(_)) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
        };
        Self { path, ticket }
    }
}

/// Origin that relative and protocol-relative script URLs resolve against.
const LOCAL_ORIGIN: &str = "http://localhost/";

/// Parse a script URL. Paths (`/meta/x.js`) and protocol-relative URLs
/// (`//relay/meta/x.js`) are resolved against a local origin.
pub fn script_url(url: &str) -> Result<Url, url::ParseError> {
    Url::parse(LOCAL_ORIGIN)?.join(url)
}

fn path_under(base: &Url, full: &Url) -> String {
    if base.origin() == full.origin() {
        let prefix = base.path().trim_end_matches('/');
        if let Some(rest) = full.path().strip_prefix(prefix) {
            if rest.starts_with('/') {
                return rest.to_string();
            }
        }
    }
    full.path().to_string()
}

// =============================================================================
// CLUSTER B: MESSAGES
// =============================================================================

/// A signed timeline message as stored by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender identity string.
    pub sender: String,
    /// Base64 of the encoded content.
    pub data: String,
    /// Base64 signature over the decoded `data` bytes.
    pub signature: String,
    /// Unix timestamp (seconds).
    pub time: i64,
    /// Display title, derived from the content when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Permalink, derived from the signature when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Decoded message content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Content type tag.
    #[serde(rename = "type", default)]
    pub kind: u8,
    /// Text body.
    #[serde(default)]
    pub text: Option<String>,
}

/// One entry of a channel feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelItem {
    /// The wrapped message.
    pub msg: Message,
}

/// Channel body: `{"item": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Feed items, newest first as served.
    #[serde(default)]
    pub item: Option<Vec<ChannelItem>>,
}

/// A channel response: `{"channel": {"item": [{"msg": ...}]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDocument {
    /// The channel body.
    pub channel: Channel,
}

impl ChannelDocument {
    /// Decode a channel response payload.
    pub fn from_payload(payload: &Payload) -> Result<Self, DecodeError> {
        serde_json::from_value(payload.clone())
            .map_err(|e| DecodeError::MalformedDocument(format!("channel: {e}")))
    }

    /// Consume the document, yielding its messages in feed order.
    pub fn into_messages(self) -> Vec<Message> {
        self.channel
            .item
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.msg)
            .collect()
    }
}

// =============================================================================
// CLUSTER C: DOCUMENTS
// =============================================================================

/// Public key description carried by a meta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaKey {
    /// Key algorithm, e.g. `ED25519`.
    pub algorithm: String,
    /// Encoded key material.
    pub data: String,
}

/// Metadata binding an identity to its public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Meta version.
    pub version: u8,
    /// Seed (the identity name), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    /// The public key.
    pub key: MetaKey,
    /// Signature of the seed by the key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Signed, mutable display attributes for an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner identity string.
    #[serde(rename = "ID")]
    pub identifier: String,
    /// JSON-encoded properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Base64 signature over `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Profile {
    /// Decoded properties; empty when `data` is absent or malformed.
    pub fn properties(&self) -> BTreeMap<String, serde_json::Value> {
        self.data
            .as_deref()
            .and_then(|data| serde_json::from_str(data).ok())
            .unwrap_or_default()
    }

    /// A string property.
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties()
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Display name.
    pub fn name(&self) -> Option<String> {
        self.property("name").filter(|n| !n.is_empty())
    }

    /// Avatar URL.
    pub fn avatar(&self) -> Option<String> {
        self.property("avatar").filter(|a| !a.is_empty())
    }

    /// True when the profile carries signed data.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}
