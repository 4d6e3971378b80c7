//! # Render Pipeline
//!
//! Verify-then-render. Each message goes through
//!
//! ```text
//!                 ┌──▶ Verified ──▶ template ──▶ appended to container
//! Unverified ─────┼──▶ Pending  ──▶ back into the PendingQueue
//!                 └──▶ Rejected ──▶ logged, dropped
//! ```
//!
//! A message is `Pending` while the messaging library is not loaded or the
//! sender's meta is unknown. It is `Rejected` when the sender does not
//! parse or the signature does not verify.

use dw_01_template::Template;
use dw_02_pending_queue::{EnqueueOutcome, PendingQueue, QueueConfig};
use dw_03_metadata::{MetadataApi, MetadataError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_bus::Notification;
use shared_types::{ChannelDocument, Identity, LibrarySlot, Message, Payload};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{Document, PermalinkScheme, RenderError};
use crate::refresh;

/// Outcome of verifying one message.
#[derive(Debug)]
pub enum Verdict {
    /// Signature checked; title and link filled in.
    Verified(Message),
    /// Sender meta (or the library) not available yet.
    Pending(Message),
    /// Dropped.
    Rejected(RenderError),
}

/// Counts from one `show_messages` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowReport {
    /// Appended to the container.
    pub rendered: usize,
    /// Put back into the pending queue.
    pub pending: usize,
    /// Dropped.
    pub rejected: usize,
}

/// Element ids and link settings used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Site root for user links.
    pub base_url: String,
    /// Permalink shape.
    pub permalink: PermalinkScheme,
    /// Default message container id.
    pub messages_container: String,
    /// Default message template id.
    pub message_template: String,
    /// Headline container id (home page).
    pub headlines_container: String,
    /// Headline template id (home page).
    pub headline_template: String,
    /// Pending queue settings.
    pub queue: QueueConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            permalink: PermalinkScheme::default(),
            messages_container: "messages".to_string(),
            message_template: "message_template".to_string(),
            headlines_container: "headlines".to_string(),
            headline_template: "headline_template".to_string(),
            queue: QueueConfig::default(),
        }
    }
}

/// Renders verified messages into the page document.
pub struct RenderPipeline {
    config: RenderConfig,
    library: LibrarySlot,
    metadata: Arc<dyn MetadataApi>,
    queue: Mutex<PendingQueue>,
    document: Arc<Mutex<Document>>,
}

impl RenderPipeline {
    /// Create a pipeline drawing into `document`.
    pub fn new(
        config: RenderConfig,
        library: LibrarySlot,
        metadata: Arc<dyn MetadataApi>,
        document: Arc<Mutex<Document>>,
    ) -> Self {
        let queue = PendingQueue::new(config.queue.clone());
        Self {
            config,
            library,
            metadata,
            queue: Mutex::new(queue),
            document,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Shared document handle.
    pub fn document(&self) -> Arc<Mutex<Document>> {
        self.document.clone()
    }

    /// Number of suspended messages.
    pub fn pending_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Suspended messages, left in place.
    pub fn pending(&self, sender: Option<&str>) -> Vec<Message> {
        self.queue.lock().peek(sender)
    }

    /// Suspend messages until their sender's meta arrives.
    ///
    /// Returns how many older messages the bounded queue evicted.
    pub fn suspend(&self, messages: impl IntoIterator<Item = Message>) -> usize {
        let mut queue = self.queue.lock();
        let mut evicted = 0;
        for message in messages {
            if park(&mut queue, message) {
                evicted += 1;
            }
        }
        evicted
    }

    /// Run one message through the verification state machine.
    pub fn verify(&self, message: Message) -> Verdict {
        let library = match self.library.get() {
            Ok(library) => library,
            Err(_) => {
                debug!("Messaging library not loaded yet, add message to waiting list");
                return Verdict::Pending(message);
            }
        };

        let sender = match library.identity(&message.sender) {
            Ok(sender) => sender,
            Err(_) => return Verdict::Rejected(RenderError::InvalidSender(message.sender)),
        };

        let meta = match self.metadata.get_meta(&sender) {
            Ok(Some(meta)) => meta,
            Ok(None) | Err(MetadataError::LibraryNotLoaded) => {
                debug!(sender = %sender, "Meta not found, waiting meta");
                return Verdict::Pending(message);
            }
            Err(e) => {
                warn!(sender = %sender, error = %e, "Meta lookup failed, waiting meta");
                return Verdict::Pending(message);
            }
        };

        if let Err(reason) = library.verify_message(&message, &meta) {
            return Verdict::Rejected(RenderError::Verification {
                sender: message.sender,
                reason,
            });
        }

        let mut message = message;
        if message.title.is_none() {
            let text = match library.decode_content(&message) {
                Ok(content) => content.text,
                Err(e) => {
                    warn!(sender = %sender, error = %e, "Message content not decodable");
                    None
                }
            };
            message.title = Some(text.unwrap_or_default());
        }
        if message.link.is_none() {
            message.link = Some(self.config.permalink.link(&message));
        }
        Verdict::Verified(message)
    }

    /// Verify and render `messages` into `container_id` with `template`.
    ///
    /// Defaults are the configured message container and template. Verified
    /// messages are appended; pending ones go back into the queue.
    /// If the page lacks the container or the template, the messages are
    /// suspended and the lookup error returned.
    pub fn show_messages(
        &self,
        messages: Vec<Message>,
        container_id: Option<&str>,
        template: Option<&Template>,
    ) -> Result<ShowReport, RenderError> {
        if messages.is_empty() {
            return Ok(ShowReport::default());
        }
        let (container_id, template) = match self.target(container_id, template) {
            Ok(target) => target,
            Err(e) => {
                self.suspend(messages);
                return Err(e);
            }
        };
        self.render_into(messages, &container_id, &template)
    }

    fn render_into(
        &self,
        messages: Vec<Message>,
        container_id: &str,
        template: &Template,
    ) -> Result<ShowReport, RenderError> {
        let mut report = ShowReport::default();
        if messages.is_empty() {
            return Ok(report);
        }

        let mut fragments = Vec::new();
        for message in messages {
            match self.verify(message) {
                Verdict::Verified(message) => match template.render_serialize(&message) {
                    Ok(html) => {
                        fragments.push(html);
                        report.rendered += 1;
                    }
                    Err(e) => {
                        error!(sender = %message.sender, error = %e, "Message template failed");
                        report.rejected += 1;
                    }
                },
                Verdict::Pending(message) => {
                    park(&mut self.queue.lock(), message);
                    report.pending += 1;
                }
                Verdict::Rejected(e) => {
                    error!(error = %e, "Message rejected");
                    report.rejected += 1;
                }
            }
        }

        let mut doc = self.document.lock();
        let container = doc
            .element_by_id_mut(container_id)
            .ok_or_else(|| RenderError::ContainerNotFound(container_id.to_string()))?;
        for html in &fragments {
            container.append_html(html)?;
        }
        refresh::refresh_timestamps(&mut doc);

        debug!(
            container = container_id,
            rendered = report.rendered,
            pending = report.pending,
            rejected = report.rejected,
            "Messages shown"
        );
        Ok(report)
    }

    /// Drain suspended messages (all, or one sender's) and show them.
    ///
    /// Nothing leaves the queue unless the page has the default container
    /// and template.
    pub fn show_pending(&self, sender: Option<&str>) -> Result<ShowReport, RenderError> {
        let (container_id, template) = self.target(None, None)?;
        let messages = self.queue.lock().drain(sender);
        self.render_into(messages, &container_id, &template)
    }

    /// Drain and show the suspended messages of `identity`, matched by
    /// address so `name@address` and bare-address senders both qualify.
    pub fn show_pending_for(&self, identity: &Identity) -> Result<ShowReport, RenderError> {
        let (container_id, template) = self.target(None, None)?;
        let library = self.library.get().ok();
        let messages = self.queue.lock().drain_where(|m| {
            let parsed = match &library {
                Some(lib) => lib.identity(&m.sender),
                None => m.sender.parse(),
            };
            parsed.is_ok_and(|sender| sender.address() == identity.address())
        });
        self.render_into(messages, &container_id, &template)
    }

    /// Channel arrival: suspend the new messages and retry everything
    /// pending.
    pub fn on_channel(&self, payload: &Payload) -> Result<ShowReport, RenderError> {
        let messages = ChannelDocument::from_payload(payload)?.into_messages();
        info!(count = messages.len(), "Received channel messages");
        self.suspend(messages);
        let report = kept_without_container(self.show_pending(None))?;
        self.refresh_identities();
        Ok(report)
    }

    /// Home page: render channel items into the headlines container
    /// without verification. Pages without that container are skipped.
    pub fn show_headlines(&self, payload: &Payload) -> Result<usize, RenderError> {
        let items = ChannelDocument::from_payload(payload)?
            .channel
            .item
            .unwrap_or_default();

        let template = {
            let doc = self.document.lock();
            if doc.element_by_id(&self.config.headlines_container).is_none() {
                return Ok(0);
            }
            match doc.element_by_id(&self.config.headline_template) {
                Some(t) => Template::new(&self.config.headline_template, t.inner_html()),
                None => return Err(RenderError::TemplateNotFound(self.config.headline_template.clone())),
            }
        };

        let fragments = items
            .iter()
            .map(|item| template.render_serialize(item))
            .collect::<Result<Vec<_>, _>>()?;

        let mut doc = self.document.lock();
        let container = doc
            .element_by_id_mut(&self.config.headlines_container)
            .ok_or_else(|| RenderError::ContainerNotFound(self.config.headlines_container.clone()))?;
        for html in &fragments {
            container.append_html(html)?;
        }
        Ok(fragments.len())
    }

    /// Page load: retry everything pending and refresh every element kind.
    pub fn on_load(&self) -> Result<ShowReport, RenderError> {
        let report = kept_without_container(self.show_pending(None))?;
        refresh::refresh_timestamps(&mut self.document.lock());
        self.refresh_avatars();
        self.refresh_identities();
        Ok(report)
    }

    /// React to a cache notification.
    pub fn on_notification(&self, notification: &Notification) -> Result<ShowReport, RenderError> {
        match notification {
            Notification::MetaReceived { identity } => {
                let report = kept_without_container(self.show_pending_for(identity))?;
                if report.rendered > 0 {
                    self.refresh_identities();
                }
                Ok(report)
            }
            Notification::ProfileReceived { .. } => {
                self.refresh_avatars();
                self.refresh_identities();
                Ok(ShowReport::default())
            }
        }
    }

    /// Refresh links and nicknames.
    pub fn refresh_identities(&self) {
        let Ok(library) = self.library.get() else {
            debug!("Messaging library not loaded, identities not refreshed");
            return;
        };
        let mut doc = self.document.lock();
        refresh::refresh_links(&mut doc, library.as_ref(), &self.config.base_url);
        refresh::refresh_nicknames(&mut doc, self.metadata.as_ref(), library.as_ref());
    }

    /// Refresh avatar images.
    pub fn refresh_avatars(&self) {
        let Ok(library) = self.library.get() else {
            debug!("Messaging library not loaded, avatars not refreshed");
            return;
        };
        let mut doc = self.document.lock();
        refresh::refresh_avatars(&mut doc, self.metadata.as_ref(), library.as_ref());
    }

    fn template(&self, id: &str) -> Result<Template, RenderError> {
        self.document
            .lock()
            .element_by_id(id)
            .map(|e| Template::new(id, e.inner_html()))
            .ok_or_else(|| RenderError::TemplateNotFound(id.to_string()))
    }

    /// Container id and template a batch renders with.
    fn target(
        &self,
        container_id: Option<&str>,
        template: Option<&Template>,
    ) -> Result<(String, Template), RenderError> {
        let container_id = container_id.unwrap_or(&self.config.messages_container);
        let template = match template {
            Some(t) => t.clone(),
            None => self.template(&self.config.message_template)?,
        };
        if self.document.lock().element_by_id(container_id).is_none() {
            return Err(RenderError::ContainerNotFound(container_id.to_string()));
        }
        Ok((container_id.to_string(), template))
    }
}

/// Queue `message`; true if the bound evicted an older one.
fn park(queue: &mut PendingQueue, message: Message) -> bool {
    match queue.enqueue(message) {
        EnqueueOutcome::Evicted(old) => {
            error!(
                sender = %old.sender,
                time = old.time,
                "Pending message evicted before its meta arrived"
            );
            true
        }
        EnqueueOutcome::Queued | EnqueueOutcome::Duplicate => false,
    }
}

/// Pages without a message list (the home page) keep messages pending.
fn kept_without_container(
    result: Result<ShowReport, RenderError>,
) -> Result<ShowReport, RenderError> {
    match result {
        Err(RenderError::ContainerNotFound(id)) | Err(RenderError::TemplateNotFound(id)) => {
            debug!(element = %id, "No message list on this page, messages stay pending");
            Ok(ShowReport::default())
        }
        other => other,
    }
}
