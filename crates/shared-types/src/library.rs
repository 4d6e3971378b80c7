//! # Messaging Library Port
//!
//! The messaging SDK owns identity rules, document decoding and signature
//! checks. Subsystems never reach for it globally: a `LibrarySlot` is handed
//! to each of them at construction and reports `LibraryNotLoaded` until the
//! SDK has been installed.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::entities::{Content, Identity, Message, Meta, Payload, Profile};
use crate::errors::{DecodeError, LibraryNotLoaded, VerifyError};

/// Capabilities the page needs from the messaging SDK.
pub trait MessagingLibrary: Send + Sync {
    /// Parse an identity string.
    fn identity(&self, string: &str) -> Result<Identity, DecodeError> {
        string.parse()
    }

    /// Decode a meta document.
    fn decode_meta(&self, payload: &Payload) -> Result<Meta, DecodeError>;

    /// Check that `meta` really belongs to `identity` (address derivation,
    /// seed and fingerprint).
    fn meta_matches(&self, meta: &Meta, identity: &Identity) -> bool;

    /// Decode a profile document.
    fn decode_profile(&self, payload: &Payload) -> Result<Profile, DecodeError>;

    /// Verify the profile signature with the owner's meta key.
    fn verify_profile(&self, profile: &Profile, meta: &Meta) -> Result<(), VerifyError>;

    /// Verify a message signature with the sender's meta key.
    fn verify_message(&self, message: &Message, meta: &Meta) -> Result<(), VerifyError>;

    /// Decode the message content carried in `data`.
    fn decode_content(&self, message: &Message) -> Result<Content, DecodeError>;

    /// Human-readable search number for an identity, e.g. `123-456-7890`.
    fn number_string(&self, identity: &Identity) -> String;
}

/// Shared handle to the messaging library; empty until installed.
#[derive(Clone, Default)]
pub struct LibrarySlot {
    inner: Arc<RwLock<Option<Arc<dyn MessagingLibrary>>>>,
}

impl LibrarySlot {
    /// A slot with no library installed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A slot with `library` already installed.
    pub fn ready(library: Arc<dyn MessagingLibrary>) -> Self {
        let slot = Self::empty();
        slot.install(library);
        slot
    }

    /// Install (or replace) the library. Visible to every clone.
    pub fn install(&self, library: Arc<dyn MessagingLibrary>) {
        *self.inner.write() = Some(library);
    }

    /// The installed library.
    pub fn get(&self) -> Result<Arc<dyn MessagingLibrary>, LibraryNotLoaded> {
        self.inner.read().clone().ok_or(LibraryNotLoaded)
    }

    /// True once a library has been installed.
    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl std::fmt::Debug for LibrarySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibrarySlot")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
