//! # Bus Adapter
//!
//! Subscribes the render pipeline to channel and profile arrivals.

use shared_bus::{Handler, HandlerError, Matcher, PredicateBus, Route, SubscriptionError};
use shared_types::{Payload, Request};
use std::sync::Arc;
use tracing::debug;

use crate::domain::RenderError;
use crate::service::RenderPipeline;

/// Live registration of a render pipeline on a bus.
pub struct RenderBusAdapter {
    pairs: Vec<(Matcher, Handler)>,
}

impl RenderBusAdapter {
    /// Register, in order: headlines and messages for channel arrivals, then
    /// identity refresh for profile arrivals.
    pub fn register(
        bus: &PredicateBus,
        pipeline: Arc<RenderPipeline>,
    ) -> Result<Self, SubscriptionError> {
        let headlines = pipeline.clone();
        let messages = pipeline.clone();
        let profiles = pipeline;

        let on_headlines: Handler =
            Arc::new(move |payload: &Payload, _: &Request| -> Result<(), HandlerError> {
                headlines.show_headlines(payload).map_err(rejected)?;
                Ok(())
            });
        let on_messages: Handler =
            Arc::new(move |payload: &Payload, _: &Request| -> Result<(), HandlerError> {
                messages.on_channel(payload).map_err(rejected)?;
                Ok(())
            });
        let on_profile: Handler =
            Arc::new(move |_: &Payload, request: &Request| -> Result<(), HandlerError> {
                debug!(path = %request.path, "Profile arrived, refreshing identities");
                profiles.refresh_identities();
                Ok(())
            });

        let pairs = [
            (Route::any_channel(), on_headlines),
            (Route::any_channel(), on_messages),
            (Route::Profile.matcher(), on_profile),
        ];

        let mut adapter = Self { pairs: Vec::new() };
        for (matcher, handler) in pairs {
            if let Err(e) = bus.subscribe(matcher.clone(), handler.clone()) {
                adapter.unregister(bus);
                return Err(e);
            }
            adapter.pairs.push((matcher, handler));
        }
        Ok(adapter)
    }

    /// Remove every handler from `bus`.
    pub fn unregister(&self, bus: &PredicateBus) -> usize {
        self.pairs
            .iter()
            .map(|(matcher, handler)| bus.unsubscribe(matcher, handler))
            .sum()
    }
}

fn rejected(e: RenderError) -> HandlerError {
    match e {
        RenderError::Decode(d) => HandlerError::Decode(d),
        other => HandlerError::Rejected(other.to_string()),
    }
}
