//! # Integration Test Flows
//!
//! Drives a full page through the script event loop: channel responses
//! suspend messages, meta responses release them, profile responses patch
//! the rendered identities.
//!
//! ## Flows Tested
//!
//! 1. **Channel → Meta → Render**: a message waits for its sender's meta
//! 2. **Signature failure**: a forged message is dropped, never re-queued
//! 3. **Per-sender drain**: a meta releases only its own sender's messages
//! 4. **Refetch window**: meta queries are suppressed inside the window

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use dw_03_metadata::TimeSource;
    use dw_04_render::Document;
    use page_runtime::{
        EventLoop, LoadError, MemoryScriptLoader, Page, PageConfig, ScriptLoader,
    };
    use shared_bus::{Handler, HandlerError, Route, SubscriptionError};
    use shared_crypto::{Account, DimLibrary};
    use shared_types::{LibrarySlot, Message, Payload, Request};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const PAGE: &str = concat!(
        r#"<h1>Dwitter</h1><div id="messages"></div>"#,
        r#"<script id="message_template" type="text/html">"#,
        r#"<div class="msg"><a did="${sender}">${title}</a>"#,
        r#"<span class="nickname" did="${sender}"></span>"#,
        r#"<span class="timestamp">${time}</span></div>"#,
        r#"</script>"#
    );

    /// Memory loader that records every URL it is asked for.
    #[derive(Default)]
    struct RecordingLoader {
        documents: MemoryScriptLoader,
        urls: Mutex<Vec<String>>,
    }

    impl RecordingLoader {
        fn fetched(&self, prefix: &str) -> usize {
            self.urls.lock().iter().filter(|u| u.starts_with(prefix)).count()
        }
    }

    #[async_trait]
    impl ScriptLoader for RecordingLoader {
        async fn import_script(&self, url: &str) -> Result<Payload, LoadError> {
            self.urls.lock().push(url.to_string());
            self.documents.import_script(url).await
        }
    }

    struct ManualClock(AtomicU64);

    impl TimeSource for ManualClock {
        fn now(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        page: Page,
        event_loop: EventLoop,
        loader: Arc<RecordingLoader>,
        clock: Arc<ManualClock>,
    }

    impl Harness {
        fn new() -> Self {
            let loader = Arc::new(RecordingLoader::default());
            let clock = Arc::new(ManualClock(AtomicU64::new(1_000)));
            let event_loop = EventLoop::new("https://dim.chat/", loader.clone());
            let config = PageConfig {
                base_url: "https://dim.chat/".into(),
                ..PageConfig::default()
            };
            let page = Page::with_clock(
                &config,
                LibrarySlot::ready(Arc::new(DimLibrary::new())),
                Document::parse(PAGE).unwrap(),
                Arc::new(event_loop.requester()),
                clock.clone(),
            )
            .unwrap();
            Self {
                page,
                event_loop,
                loader,
                clock,
            }
        }

        fn serve_channel(&self, name: &str, messages: &[Message]) {
            let items: Vec<_> = messages.iter().map(|m| json!({ "msg": m })).collect();
            self.loader
                .documents
                .insert(format!("/channel/{name}.js"), json!({"channel": {"item": items}}));
        }

        fn serve_meta(&self, account: &Account) {
            self.loader.documents.insert(
                format!("/meta/{}.js", account.identity().address()),
                account.meta_payload(),
            );
        }

        async fn open(&mut self, channel: &str) -> usize {
            self.page.open_channel(channel);
            self.event_loop.run_until_idle(&self.page).await
        }

        fn messages_html(&self) -> String {
            let doc = self.page.pipeline().document();
            let doc = doc.lock();
            doc.element_by_id("messages").unwrap().inner_html()
        }
    }

    // =============================================================================
    // INTEGRATION TESTS: CHANNEL → META → RENDER
    // =============================================================================

    #[tokio::test]
    async fn test_message_waits_for_meta_then_renders() {
        let mut h = Harness::new();
        let moky = Account::generate("moky");
        h.serve_channel("moky", &[moky.post("first", 1_560_000_000)]);
        h.serve_meta(&moky);

        // channel, meta; the profile is not served
        assert_eq!(h.open("moky").await, 2);

        assert_eq!(h.page.pipeline().pending_len(), 0);
        let html = h.messages_html();
        assert!(html.contains(">first</a>"));
        assert!(html.contains(&format!(
            r#"href="https://dim.chat/user/{}""#,
            moky.identity().address()
        )));
        assert!(!html.contains("1560000000"));
        assert_eq!(h.loader.fetched("https://dim.chat/profile/"), 1);
    }

    #[tokio::test]
    async fn test_forged_message_dropped() {
        let mut h = Harness::new();
        let moky = Account::generate("moky");
        let mut forged = moky.post("forged", 1);
        forged.signature = Account::generate("moky").post("forged", 1).signature;
        h.serve_channel("moky", &[forged, moky.post("genuine", 2)]);
        h.serve_meta(&moky);

        h.open("moky").await;

        let html = h.messages_html();
        assert!(html.contains(">genuine</a>"));
        assert!(!html.contains("forged"));
        assert_eq!(h.page.pipeline().pending_len(), 0);

        // Reopening the channel does not resurrect it either.
        h.open("moky").await;
        assert!(!h.messages_html().contains("forged"));
        assert_eq!(h.messages_html().matches(">genuine</a>").count(), 2);
    }

    #[tokio::test]
    async fn test_meta_releases_only_its_sender() {
        let mut h = Harness::new();
        let alice = Account::generate("alice");
        let bob = Account::generate("bob");
        h.serve_channel(
            "mixed",
            &[alice.post("a-one", 1), bob.post("b-one", 2), alice.post("a-two", 3)],
        );
        h.serve_meta(&alice);

        h.open("mixed").await;

        let html = h.messages_html();
        let one = html.find("a-one").unwrap();
        let two = html.find("a-two").unwrap();
        assert!(one < two);
        assert!(!html.contains("b-one"));

        let pending = h.page.pipeline().pending(None);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sender, bob.identity().to_string());

        // Bob's meta shows up later.
        h.serve_meta(&bob);
        h.clock.0.store(1_300, Ordering::SeqCst);
        h.open("mixed").await;
        assert!(h.messages_html().contains("b-one"));
        assert_eq!(h.page.pipeline().pending_len(), 0);
    }

    // =============================================================================
    // INTEGRATION TESTS: REFETCH WINDOW
    // =============================================================================

    #[tokio::test]
    async fn test_meta_refetch_window() {
        let mut h = Harness::new();
        let hulk = Account::generate("hulk");
        h.serve_channel("hulk", &[hulk.post("smash", 1), hulk.post("again", 2)]);
        let meta_url = "https://dim.chat/meta/";

        h.open("hulk").await;
        assert_eq!(h.loader.fetched(meta_url), 1);
        assert_eq!(h.page.pipeline().pending_len(), 2);

        h.clock.0.store(1_299, Ordering::SeqCst);
        h.open("hulk").await;
        assert_eq!(h.loader.fetched(meta_url), 1);
        // Duplicates by signature were not queued twice.
        assert_eq!(h.page.pipeline().pending_len(), 2);

        h.clock.0.store(1_300, Ordering::SeqCst);
        h.open("hulk").await;
        assert_eq!(h.loader.fetched(meta_url), 2);
        assert!(h.messages_html().is_empty());
    }

    // =============================================================================
    // INTEGRATION TESTS: BUS CONTRACT
    // =============================================================================

    #[tokio::test]
    async fn test_duplicate_subscription_on_page_bus() {
        let h = Harness::new();
        let bus = h.page.bus();
        let before = bus.subscriber_count();

        let matcher = Route::Meta.matcher();
        let handler: Handler = Arc::new(|_: &Payload, _: &Request| -> Result<(), HandlerError> {
            Ok(())
        });
        bus.subscribe(matcher.clone(), handler.clone()).unwrap();
        assert_eq!(
            bus.subscribe(matcher.clone(), handler.clone()),
            Err(SubscriptionError::Duplicate)
        );
        assert_eq!(bus.subscriber_count(), before + 1);

        // The page's metadata handler runs before the late subscriber.
        let moky = Account::generate("moky");
        let request = Request::new(format!("/meta/{}.js", moky.identity().address()));
        let report = bus.publish(&moky.meta_payload(), &request);
        assert_eq!(report.matched, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(h.page.metadata().meta_count(), 1);
    }
}
