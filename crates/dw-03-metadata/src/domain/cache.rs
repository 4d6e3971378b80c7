//! # Document Cache
//!
//! Stored metas and profiles, keyed by address. The identity recorded with
//! a meta carries its seed name, so bare addresses can be resolved to the
//! full `name@address` form.

use shared_types::{Identity, Meta, Profile};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct MetaEntry {
    identity: Identity,
    meta: Meta,
}

/// Meta and profile storage.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    metas: HashMap<String, MetaEntry>,
    profiles: HashMap<String, Profile>,
}

impl DocumentCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `meta` for `identity`, replacing any previous one.
    pub fn put_meta(&mut self, identity: Identity, meta: Meta) {
        self.metas
            .insert(identity.address().to_string(), MetaEntry { identity, meta });
    }

    /// Meta stored for the identity's address.
    pub fn meta(&self, identity: &Identity) -> Option<&Meta> {
        self.metas.get(identity.address()).map(|e| &e.meta)
    }

    /// The named identity recorded for `address`.
    pub fn identity(&self, address: &str) -> Option<&Identity> {
        self.metas.get(address).map(|e| &e.identity)
    }

    /// Store `profile` for `identity`.
    pub fn put_profile(&mut self, identity: &Identity, profile: Profile) {
        self.profiles.insert(identity.address().to_string(), profile);
    }

    /// Profile stored for the identity's address.
    pub fn profile(&self, identity: &Identity) -> Option<&Profile> {
        self.profiles.get(identity.address())
    }

    /// Number of stored metas.
    pub fn meta_count(&self) -> usize {
        self.metas.len()
    }

    /// Number of stored profiles.
    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }
}
