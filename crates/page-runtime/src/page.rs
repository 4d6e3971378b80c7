//! # Page Wiring
//!
//! One `Page` owns the bus, the notification center and the subsystems of a
//! loaded page. Registration order on the bus is metadata first, then the
//! render pipeline, so a profile is cached before identities are refreshed.

use parking_lot::Mutex;
use shared_bus::{
    NotificationCenter, NotificationFilter, NotificationSubscription, PredicateBus, Route,
    SubscriptionError,
};
use shared_types::{FetchTicket, LibrarySlot, Payload, Request};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use dw_03_metadata::{
    MetadataBusAdapter, MetadataService, ScriptRequester, SystemTimeSource, TimeSource,
};
use dw_04_render::{Document, RenderBusAdapter, RenderPipeline, ShowReport};

use crate::container::PageConfig;
use crate::event_loop::Dispatcher;

/// Page start-up errors.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Bus registration failed: {0}")]
    Subscription(#[from] SubscriptionError),
}

/// A loaded page and its subsystems.
pub struct Page {
    bus: PredicateBus,
    notifications: Arc<NotificationCenter>,
    inbox: Mutex<NotificationSubscription>,
    library: LibrarySlot,
    requester: Arc<dyn ScriptRequester>,
    metadata: Arc<MetadataService>,
    pipeline: Arc<RenderPipeline>,
    metadata_adapter: MetadataBusAdapter,
    render_adapter: RenderBusAdapter,
    base_url: String,
}

impl Page {
    /// Wire the subsystems for `document` using the system clock.
    pub fn new(
        config: &PageConfig,
        library: LibrarySlot,
        document: Document,
        requester: Arc<dyn ScriptRequester>,
    ) -> Result<Self, PageError> {
        Self::with_clock(config, library, document, requester, Arc::new(SystemTimeSource))
    }

    /// Wire the subsystems with an explicit clock.
    pub fn with_clock(
        config: &PageConfig,
        library: LibrarySlot,
        document: Document,
        requester: Arc<dyn ScriptRequester>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, PageError> {
        let bus = PredicateBus::new();
        let notifications = Arc::new(NotificationCenter::new());
        let inbox = Mutex::new(notifications.subscribe(NotificationFilter::all()));

        let metadata = Arc::new(MetadataService::new(
            config.metadata(),
            library.clone(),
            Arc::clone(&requester),
            clock,
            Arc::clone(&notifications),
        ));
        let pipeline = Arc::new(RenderPipeline::new(
            config.render(),
            library.clone(),
            metadata.clone(),
            Arc::new(Mutex::new(document)),
        ));

        let metadata_adapter = MetadataBusAdapter::register(&bus, metadata.clone())?;
        let render_adapter = match RenderBusAdapter::register(&bus, pipeline.clone()) {
            Ok(adapter) => adapter,
            Err(e) => {
                metadata_adapter.unregister(&bus);
                return Err(e.into());
            }
        };
        info!(
            subscribers = bus.subscriber_count(),
            base_url = %config.base_url,
            "Page wired"
        );

        Ok(Self {
            bus,
            notifications,
            inbox,
            library,
            requester,
            metadata,
            pipeline,
            metadata_adapter,
            render_adapter,
            base_url: config.base_url.clone(),
        })
    }

    /// Page load: show what is pending and refresh every element kind.
    pub fn on_load(&self) -> ShowReport {
        if !self.library.is_loaded() {
            warn!("Page loaded before the messaging library");
        }
        match self.pipeline.on_load() {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Page load rendering failed");
                ShowReport::default()
            }
        }
    }

    /// Request the channel feed of `identity`.
    pub fn open_channel(&self, identity: &str) -> FetchTicket {
        let url = Route::Channel.url(&self.base_url, identity);
        info!(%url, "Opening channel");
        self.requester.request(&url)
    }

    /// Hand queued cache notifications to the render pipeline.
    pub fn pump_notifications(&self) -> usize {
        let pending = self.inbox.lock().drain();
        for notification in &pending {
            if let Err(e) = self.pipeline.on_notification(notification) {
                error!(
                    identity = %notification.identity(),
                    error = %e,
                    "Notification handling failed"
                );
            }
        }
        pending.len()
    }

    /// Serialized page body.
    pub fn html(&self) -> String {
        self.pipeline.document().lock().to_html()
    }

    pub fn bus(&self) -> &PredicateBus {
        &self.bus
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn library(&self) -> &LibrarySlot {
        &self.library
    }

    pub fn metadata(&self) -> &Arc<MetadataService> {
        &self.metadata
    }

    pub fn pipeline(&self) -> &Arc<RenderPipeline> {
        &self.pipeline
    }

    /// Remove every subsystem handler from the bus.
    pub fn shutdown(&self) -> usize {
        let removed = self.render_adapter.unregister(&self.bus)
            + self.metadata_adapter.unregister(&self.bus);
        info!(removed, "Page handlers removed");
        removed
    }
}

impl Dispatcher for Page {
    fn dispatch(&self, payload: &Payload, request: &Request) {
        let report = self.bus.publish(payload, request);
        if report.matched == 0 {
            debug!(path = %request.path, "No subscriber for response");
        }
        let pumped = self.pump_notifications();
        debug!(
            path = %request.path,
            matched = report.matched,
            failed = report.failed,
            notifications = pumped,
            "Response dispatched"
        );
    }
}
