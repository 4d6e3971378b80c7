//! # Metadata Service
//!
//! Implements `MetadataApi` over a `DocumentCache`, two `QueryHistory`
//! windows (meta, profile) and the outbound ports.

use parking_lot::Mutex;
use shared_bus::{Notification, NotificationCenter, Route};
use shared_types::{
    Identity, LibrarySlot, MessagingLibrary, Meta, Payload, Profile, Request,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::domain::{DocumentCache, MetadataConfig, MetadataError, QueryHistory};
use crate::ports::{MetadataApi, ScriptRequester, TimeSource};

struct State {
    cache: DocumentCache,
    meta_queries: QueryHistory,
    profile_queries: QueryHistory,
}

/// Meta and profile cache with debounced fetching.
pub struct MetadataService {
    config: MetadataConfig,
    library: LibrarySlot,
    requester: Arc<dyn ScriptRequester>,
    clock: Arc<dyn TimeSource>,
    notifications: Arc<NotificationCenter>,
    state: Mutex<State>,
}

impl MetadataService {
    /// Create the service.
    pub fn new(
        config: MetadataConfig,
        library: LibrarySlot,
        requester: Arc<dyn ScriptRequester>,
        clock: Arc<dyn TimeSource>,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        let state = State {
            cache: DocumentCache::new(),
            meta_queries: QueryHistory::with_window(config.debounce_secs),
            profile_queries: QueryHistory::with_window(config.debounce_secs),
        };
        Self {
            config,
            library,
            requester,
            clock,
            notifications,
            state: Mutex::new(state),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    /// URL of the meta document for `identity`.
    pub fn meta_url(&self, identity: &Identity) -> String {
        Route::Meta.url(&self.config.base_url, identity.address())
    }

    /// URL of the profile document for `identity`.
    pub fn profile_url(&self, identity: &Identity) -> String {
        Route::Profile.url(&self.config.base_url, identity.address())
    }

    /// Store a meta directly, e.g. one of a local account.
    ///
    /// Mismatching metas are refused. No notification is posted.
    pub fn save_meta(&self, identity: Identity, meta: Meta) -> Result<(), MetadataError> {
        let library = self.library.get()?;
        if !library.meta_matches(&meta, &identity) {
            return Err(MetadataError::MetaMismatch {
                identity: identity.to_string(),
            });
        }
        self.state.lock().cache.put_meta(identity, meta);
        Ok(())
    }

    /// Number of cached metas.
    pub fn meta_count(&self) -> usize {
        self.state.lock().cache.meta_count()
    }

    fn query_meta(&self, identity: &Identity) {
        let now = self.clock.now();
        let allowed = self
            .state
            .lock()
            .meta_queries
            .should_query(identity.address(), now);
        if !allowed {
            debug!(identity = %identity, "Meta query suppressed");
            return;
        }
        let url = self.meta_url(identity);
        let ticket = self.requester.request(&url);
        debug!(identity = %identity, %url, ticket = %ticket.0, "Meta query issued");
    }

    fn query_profile(&self, identity: &Identity) {
        let now = self.clock.now();
        let allowed = self
            .state
            .lock()
            .profile_queries
            .should_query(identity.address(), now);
        if !allowed {
            debug!(identity = %identity, "Profile query suppressed");
            return;
        }
        let url = self.profile_url(identity);
        let ticket = self.requester.request(&url);
        debug!(identity = %identity, %url, ticket = %ticket.0, "Profile query issued");
    }

    fn path_identity(
        library: &dyn MessagingLibrary,
        route: Route,
        request: &Request,
    ) -> Result<Identity, MetadataError> {
        let segment = route
            .segment(&request.path)
            .ok_or_else(|| MetadataError::UnexpectedPath(request.path.clone()))?;
        library
            .identity(segment)
            .map_err(|_| MetadataError::InvalidIdentity(segment.to_string()))
    }

    fn accept_meta(&self, payload: &Payload, request: &Request) -> Result<Identity, MetadataError> {
        let library = self.library.get()?;
        let identity = Self::path_identity(library.as_ref(), Route::Meta, request)?;
        let meta = library
            .decode_meta(payload)
            .map_err(MetadataError::MalformedMeta)?;

        let identity = match identity.name() {
            Some(_) => identity,
            None => identity.with_name(meta.seed.clone()),
        };
        if !library.meta_matches(&meta, &identity) {
            return Err(MetadataError::MetaMismatch {
                identity: identity.to_string(),
            });
        }

        self.state.lock().cache.put_meta(identity.clone(), meta);
        Ok(identity)
    }

    fn accept_profile(
        &self,
        payload: &Payload,
        request: &Request,
    ) -> Result<Identity, MetadataError> {
        let library = self.library.get()?;
        let identity = Self::path_identity(library.as_ref(), Route::Profile, request)?;
        let profile = library
            .decode_profile(payload)
            .map_err(MetadataError::MalformedProfile)?;

        let owner = library
            .identity(&profile.identifier)
            .map_err(|_| MetadataError::InvalidIdentity(profile.identifier.clone()))?;
        if owner.address() != identity.address() {
            return Err(MetadataError::ProfileMismatch {
                identity: identity.to_string(),
                profile: owner.to_string(),
            });
        }
        let identity = match identity.name() {
            Some(_) => identity,
            None => owner,
        };

        let mut state = self.state.lock();
        if let Some(meta) = state.cache.meta(&identity) {
            library
                .verify_profile(&profile, meta)
                .map_err(|reason| MetadataError::ProfileRejected {
                    identity: identity.to_string(),
                    reason,
                })?;
        }
        state.cache.put_profile(&identity, profile);
        Ok(identity)
    }
}

impl MetadataApi for MetadataService {
    fn get_meta(&self, identity: &Identity) -> Result<Option<Meta>, MetadataError> {
        self.library.get()?;
        let cached = self.state.lock().cache.meta(identity).cloned();
        if cached.is_none() {
            self.query_meta(identity);
        }
        Ok(cached)
    }

    fn get_profile(&self, identity: &Identity) -> Result<Option<Profile>, MetadataError> {
        self.library.get()?;
        let cached = self.state.lock().cache.profile(identity).cloned();
        if !cached.as_ref().is_some_and(Profile::has_data) {
            self.query_profile(identity);
        }
        Ok(cached)
    }

    fn known_identity(&self, address: &str) -> Option<Identity> {
        self.state.lock().cache.identity(address).cloned()
    }

    fn on_meta_response(
        &self,
        payload: &Payload,
        request: &Request,
    ) -> Result<Identity, MetadataError> {
        match self.accept_meta(payload, request) {
            Ok(identity) => {
                info!(identity = %identity, "Received meta");
                self.notifications.post(Notification::MetaReceived {
                    identity: identity.clone(),
                });
                Ok(identity)
            }
            Err(e) => {
                error!(path = %request.path, error = %e, "Failed to save meta");
                Err(e)
            }
        }
    }

    fn on_profile_response(
        &self,
        payload: &Payload,
        request: &Request,
    ) -> Result<Identity, MetadataError> {
        match self.accept_profile(payload, request) {
            Ok(identity) => {
                info!(identity = %identity, "Received profile");
                self.notifications.post(Notification::ProfileReceived {
                    identity: identity.clone(),
                });
                Ok(identity)
            }
            Err(e) => {
                error!(path = %request.path, error = %e, "Failed to save profile");
                Err(e)
            }
        }
    }
}
