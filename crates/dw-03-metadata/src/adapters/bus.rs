//! # Bus Adapter
//!
//! Registers the meta and profile response handlers on the predicate bus.
//! Keeps the registered pairs so they can be removed again.

use shared_bus::{Handler, HandlerError, Matcher, PredicateBus, Route, SubscriptionError};
use shared_types::{Payload, Request};
use std::sync::Arc;

use crate::ports::MetadataApi;

/// Live registration of a metadata service on a bus.
pub struct MetadataBusAdapter {
    meta: (Matcher, Handler),
    profile: (Matcher, Handler),
}

impl MetadataBusAdapter {
    /// Subscribe `service` to `/meta/{id}.js` and `/profile/{id}.js`.
    pub fn register<S>(bus: &PredicateBus, service: Arc<S>) -> Result<Self, SubscriptionError>
    where
        S: MetadataApi + 'static,
    {
        let meta_service = service.clone();
        let meta: (Matcher, Handler) = (
            Route::Meta.matcher(),
            Arc::new(move |payload: &Payload, request: &Request| -> Result<(), HandlerError> {
                meta_service.on_meta_response(payload, request)?;
                Ok(())
            }),
        );

        let profile: (Matcher, Handler) = (
            Route::Profile.matcher(),
            Arc::new(move |payload: &Payload, request: &Request| -> Result<(), HandlerError> {
                service.on_profile_response(payload, request)?;
                Ok(())
            }),
        );

        bus.subscribe(meta.0.clone(), meta.1.clone())?;
        if let Err(e) = bus.subscribe(profile.0.clone(), profile.1.clone()) {
            bus.unsubscribe(&meta.0, &meta.1);
            return Err(e);
        }
        Ok(Self { meta, profile })
    }

    /// Remove both handlers from `bus`.
    pub fn unregister(&self, bus: &PredicateBus) -> usize {
        bus.unsubscribe(&self.meta.0, &self.meta.1)
            + bus.unsubscribe(&self.profile.0, &self.profile.1)
    }
}
