//! # Inbound Ports (Driving Ports)
//!
//! API offered to the rest of the page.

use shared_types::{Identity, Meta, Payload, Profile, Request};

use crate::domain::MetadataError;

/// Metadata lookups and response intake.
pub trait MetadataApi: Send + Sync {
    /// Cached meta for `identity`. On a miss a fetch is issued (at most once
    /// per window) and `Ok(None)` returned.
    ///
    /// # Errors
    ///
    /// `MetadataError::LibraryNotLoaded` before the messaging library is
    /// installed.
    fn get_meta(&self, identity: &Identity) -> Result<Option<Meta>, MetadataError>;

    /// Cached profile for `identity`. A missing profile, or one without
    /// signed data, triggers a (debounced) fetch.
    fn get_profile(&self, identity: &Identity) -> Result<Option<Profile>, MetadataError>;

    /// Named identity recorded for `address`, once its meta is known.
    fn known_identity(&self, address: &str) -> Option<Identity>;

    /// Handle a `/meta/{id}.js` response. Returns the identity stored.
    fn on_meta_response(&self, payload: &Payload, request: &Request)
        -> Result<Identity, MetadataError>;

    /// Handle a `/profile/{id}.js` response. Returns the identity stored.
    fn on_profile_response(
        &self,
        payload: &Payload,
        request: &Request,
    ) -> Result<Identity, MetadataError>;
}
