//! # Script Event Loop
//!
//! Fetches scripts issued by the page subsystems and delivers each completed
//! response to the page, one at a time.
//!
//! ```text
//! MetadataService ──request(url)──▶ LoopRequester ──Fetch{ticket,url}──▶ mpsc
//!                                                                        │
//!   Dispatcher ◀──(payload, request)── EventLoop ◀── JoinSet<import_script>
//! ```
//!
//! A delivery runs to completion before the next completed fetch is taken.
//! Fetches issued during a delivery are picked up afterwards. A cancelled
//! ticket is never delivered, even when its fetch had already finished.

use async_trait::async_trait;
use shared_types::{FetchTicket, Payload, Request};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, info, warn};

use dw_03_metadata::ScriptRequester;

/// Script loading errors.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No response exists for the URL.
    #[error("Script not found: {0}")]
    NotFound(String),

    /// URL path escapes the site root.
    #[error("Invalid script path: {0}")]
    InvalidPath(String),

    /// Response could not be read.
    #[error("Cannot read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Response body is not a JSON document.
    #[error("Malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The relay answered with an error document.
    #[error("Relay error {code} for {url}: {message}")]
    Relay {
        url: String,
        code: i64,
        message: String,
    },
}

/// Loads a script response for a URL.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Fetch `url` and return the document it carries.
    async fn import_script(&self, url: &str) -> Result<Payload, LoadError>;
}

/// Receives completed fetches.
pub trait Dispatcher {
    /// Deliver one response.
    fn dispatch(&self, payload: &Payload, request: &Request);

    /// A fetch failed; nothing is delivered for it.
    fn load_failed(&self, url: &str, error: &LoadError) {
        warn!(url, error = %error, "Script load failed");
    }
}

/// Commands accepted by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCommand {
    /// Start fetching `url` under `ticket`.
    Fetch { ticket: FetchTicket, url: String },
    /// Abandon the fetch of `ticket`.
    Cancel(FetchTicket),
}

/// Handle the page subsystems use to issue fetches.
#[derive(Debug, Clone)]
pub struct LoopRequester {
    commands: mpsc::UnboundedSender<LoopCommand>,
}

impl LoopRequester {
    /// Cancel the fetch of `ticket`.
    pub fn cancel(&self, ticket: FetchTicket) {
        if self.commands.send(LoopCommand::Cancel(ticket)).is_err() {
            debug!(?ticket, "Event loop gone, nothing to cancel");
        }
    }
}

impl ScriptRequester for LoopRequester {
    fn request(&self, url: &str) -> FetchTicket {
        let ticket = FetchTicket::new();
        let command = LoopCommand::Fetch {
            ticket,
            url: url.to_string(),
        };
        if self.commands.send(command).is_err() {
            error!(url, "Event loop gone, fetch dropped");
        }
        ticket
    }
}

type Completion = (FetchTicket, String, Result<Payload, LoadError>);

/// The page's script event loop.
pub struct EventLoop {
    base_url: String,
    loader: Arc<dyn ScriptLoader>,
    requester: LoopRequester,
    commands: mpsc::UnboundedReceiver<LoopCommand>,
    tasks: JoinSet<Completion>,
    in_flight: HashMap<FetchTicket, AbortHandle>,
    delivered: u64,
}

impl EventLoop {
    /// A loop resolving script URLs under `base_url` through `loader`.
    pub fn new(base_url: impl Into<String>, loader: Arc<dyn ScriptLoader>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            base_url: base_url.into(),
            loader,
            requester: LoopRequester { commands: tx },
            commands: rx,
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
            delivered: 0,
        }
    }

    /// A requester feeding this loop.
    pub fn requester(&self) -> LoopRequester {
        self.requester.clone()
    }

    /// Fetches started and not yet delivered or cancelled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Responses delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Request descriptor of `url`, with its path relative to the base URL.
    pub fn request_for(&self, url: &str, ticket: FetchTicket) -> Request {
        Request::relative_to(&self.base_url, url, Some(ticket))
    }

    /// Run until no command is queued and nothing is in flight.
    ///
    /// Returns the number of responses delivered by this call.
    pub async fn run_until_idle(&mut self, dispatcher: &dyn Dispatcher) -> usize {
        let mut delivered = 0;
        loop {
            self.take_commands();
            let Some(joined) = self.tasks.join_next().await else {
                break;
            };
            let (ticket, url, result) = match joined {
                Ok(completion) => completion,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    error!(error = %e, "Fetch task panicked");
                    continue;
                }
            };
            // Cancels issued while the fetch was finishing.
            self.take_commands();
            if self.in_flight.remove(&ticket).is_none() {
                debug!(%url, "Dropping response of cancelled fetch");
                continue;
            }
            match result {
                Ok(payload) => {
                    let request = self.request_for(&url, ticket);
                    debug!(path = %request.path, "Delivering response");
                    dispatcher.dispatch(&payload, &request);
                    delivered += 1;
                    self.delivered += 1;
                }
                Err(e) => dispatcher.load_failed(&url, &e),
            }
        }
        delivered
    }

    fn take_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                LoopCommand::Fetch { ticket, url } => self.spawn(ticket, url),
                LoopCommand::Cancel(ticket) => self.cancel(ticket),
            }
        }
    }

    fn spawn(&mut self, ticket: FetchTicket, url: String) {
        debug!(%url, ?ticket, "Fetching script");
        let loader = Arc::clone(&self.loader);
        let handle = self.tasks.spawn(async move {
            let result = loader.import_script(&url).await;
            (ticket, url, result)
        });
        self.in_flight.insert(ticket, handle);
    }

    fn cancel(&mut self, ticket: FetchTicket) {
        match self.in_flight.remove(&ticket) {
            Some(handle) => {
                handle.abort();
                info!(?ticket, "Fetch cancelled");
            }
            None => debug!(?ticket, "Cancel for unknown or finished fetch"),
        }
    }
}

/// Serves script responses from a local mirror of the relay web server.
///
/// The URL path selects the file under the root. A body is either a bare
/// JSON document or the relay's callback form
/// `dim.js.respond(<document>,{"path":"..."});`.
#[derive(Debug, Clone)]
pub struct FileScriptLoader {
    root: PathBuf,
}

impl FileScriptLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File backing `url`.
    pub fn resolve(&self, url: &str) -> Result<PathBuf, LoadError> {
        // URL parsing folds dot segments away; refuse them up front.
        let raw = url.split(['?', '#']).next().unwrap_or(url);
        if raw.split('/').any(|segment| segment == "..") {
            return Err(LoadError::InvalidPath(raw.to_string()));
        }
        let path = Request::from_url(url, None).path;
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(LoadError::InvalidPath(path));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ScriptLoader for FileScriptLoader {
    async fn import_script(&self, url: &str) -> Result<Payload, LoadError> {
        let file = self.resolve(url)?;
        let body = match tokio::fs::read_to_string(&file).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(url.to_string()))
            }
            Err(source) => {
                return Err(LoadError::Io {
                    url: url.to_string(),
                    source,
                })
            }
        };
        parse_response(url, &body)
    }
}

/// Serves documents registered by URL path.
#[derive(Debug, Default)]
pub struct MemoryScriptLoader {
    documents: parking_lot::RwLock<HashMap<String, Payload>>,
}

impl MemoryScriptLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `payload` for every URL whose path is `path`.
    pub fn insert(&self, path: impl Into<String>, payload: Payload) {
        self.documents.write().insert(path.into(), payload);
    }

    /// Stop serving `path`.
    pub fn remove(&self, path: &str) -> Option<Payload> {
        self.documents.write().remove(path)
    }
}

#[async_trait]
impl ScriptLoader for MemoryScriptLoader {
    async fn import_script(&self, url: &str) -> Result<Payload, LoadError> {
        let path = Request::from_url(url, None).path;
        self.documents
            .read()
            .get(&path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(url.to_string()))
    }
}

const CALLBACK: &str = "dim.js.respond(";

/// Extract the document from a script response body.
pub fn parse_response(url: &str, body: &str) -> Result<Payload, LoadError> {
    let body = body.trim();
    let json = body.strip_prefix(CALLBACK).unwrap_or(body);
    let payload = serde_json::Deserializer::from_str(json)
        .into_iter::<Payload>()
        .next()
        .unwrap_or_else(|| serde_json::from_str::<Payload>(""))
        .map_err(|source| LoadError::Malformed {
            url: url.to_string(),
            source,
        })?;

    if let (Some(code), Some(message)) = (
        payload.get("code").and_then(Payload::as_i64),
        payload.get("message").and_then(Payload::as_str),
    ) {
        if code >= 400 {
            return Err(LoadError::Relay {
                url: url.to_string(),
                code,
                message: message.to_string(),
            });
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    /// Serves canned documents; URLs containing `slow` take a while.
    struct StaticLoader(HashMap<String, Payload>);

    #[async_trait]
    impl ScriptLoader for StaticLoader {
        async fn import_script(&self, url: &str) -> Result<Payload, LoadError> {
            if url.contains("slow") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| LoadError::NotFound(url.to_string()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        paths: Mutex<Vec<String>>,
        failures: Mutex<Vec<String>>,
        follow_up: Mutex<Option<(LoopRequester, String)>>,
    }

    impl Dispatcher for Recorder {
        fn dispatch(&self, _payload: &Payload, request: &Request) {
            self.paths.lock().push(request.path.clone());
            if let Some((requester, url)) = self.follow_up.lock().take() {
                requester.request(&url);
            }
        }

        fn load_failed(&self, url: &str, _error: &LoadError) {
            self.failures.lock().push(url.to_string());
        }
    }

    fn loader(urls: &[&str]) -> Arc<dyn ScriptLoader> {
        Arc::new(StaticLoader(
            urls.iter().map(|u| (u.to_string(), json!({"url": u}))).collect(),
        ))
    }

    #[tokio::test]
    async fn test_delivers_and_goes_idle() {
        let mut event_loop = EventLoop::new("http://relay/", loader(&["http://relay/meta/a.js"]));
        let requester = event_loop.requester();
        let ticket = requester.request("http://relay/meta/a.js");
        requester.request("http://relay/meta/missing.js");

        let recorder = Recorder::default();
        assert_eq!(event_loop.run_until_idle(&recorder).await, 1);
        assert_eq!(*recorder.paths.lock(), vec!["/meta/a.js".to_string()]);
        assert_eq!(
            *recorder.failures.lock(),
            vec!["http://relay/meta/missing.js".to_string()]
        );
        assert_eq!(event_loop.in_flight(), 0);
        assert_eq!(event_loop.request_for("http://relay/meta/a.js", ticket).ticket, Some(ticket));
    }

    #[tokio::test]
    async fn test_fetches_issued_during_delivery_run() {
        let mut event_loop = EventLoop::new("/", loader(&["/channel/a.js", "/meta/b.js"]));
        let requester = event_loop.requester();
        requester.request("/channel/a.js");

        let recorder = Recorder::default();
        *recorder.follow_up.lock() = Some((requester.clone(), "/meta/b.js".to_string()));

        assert_eq!(event_loop.run_until_idle(&recorder).await, 2);
        assert_eq!(
            *recorder.paths.lock(),
            vec!["/channel/a.js".to_string(), "/meta/b.js".to_string()]
        );
        assert_eq!(event_loop.delivered(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_never_delivered() {
        let mut event_loop = EventLoop::new("/", loader(&["/meta/slow.js", "/meta/fast.js"]));
        let requester = event_loop.requester();
        let slow = requester.request("/meta/slow.js");
        requester.request("/meta/fast.js");
        requester.cancel(slow);

        let recorder = Recorder::default();
        assert_eq!(event_loop.run_until_idle(&recorder).await, 1);
        assert_eq!(*recorder.paths.lock(), vec!["/meta/fast.js".to_string()]);
        assert!(recorder.failures.lock().is_empty());
    }

    #[test]
    fn test_request_relative_to_base() {
        let event_loop = EventLoop::new("http://relay/dwitter-web/", loader(&[]));
        let ticket = FetchTicket::new();
        let request = event_loop.request_for("http://relay/dwitter-web/meta/abc.js?t=1", ticket);
        assert_eq!(request.path, "/meta/abc.js");

        let other = event_loop.request_for("https://elsewhere/profile/abc.js", ticket);
        assert_eq!(other.path, "/profile/abc.js");

        let event_loop = EventLoop::new("//dwitter.test/", loader(&[]));
        let request = event_loop.request_for("//dwitter.test/meta/abc.js", ticket);
        assert_eq!(request.path, "/meta/abc.js");
    }

    #[test]
    fn test_parse_response_forms() {
        let bare = parse_response("u", r#"{"key": 1}"#).unwrap();
        assert_eq!(bare, json!({"key": 1}));

        let wrapped = parse_response(
            "u",
            "dim.js.respond({\"key\": 2},{\"path\":\"/meta/x.js\"});\n",
        )
        .unwrap();
        assert_eq!(wrapped, json!({"key": 2}));

        let relay = parse_response(
            "u",
            r#"dim.js.respond({"code": 404, "name": "Not Found", "message": "meta not found: x"},{"path":"/meta/x.js"});"#,
        );
        assert!(matches!(relay, Err(LoadError::Relay { code: 404, .. })));

        assert!(matches!(parse_response("u", "alert(1)"), Err(LoadError::Malformed { .. })));
        assert!(matches!(parse_response("u", ""), Err(LoadError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_memory_loader_keys_by_path() {
        let memory = MemoryScriptLoader::new();
        memory.insert("/meta/abc.js", json!({"seed": "moky"}));
        let payload = memory.import_script("https://dim.chat/meta/abc.js").await.unwrap();
        assert_eq!(payload["seed"], "moky");

        assert!(memory.remove("/meta/abc.js").is_some());
        assert!(matches!(
            memory.import_script("/meta/abc.js").await,
            Err(LoadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_loader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("meta")).unwrap();
        std::fs::write(
            dir.path().join("meta/abc.js"),
            r#"dim.js.respond({"seed": "moky"},{"path":"/meta/abc.js"});"#,
        )
        .unwrap();

        let files = FileScriptLoader::new(dir.path());
        let payload = files.import_script("https://dim.chat/meta/abc.js").await.unwrap();
        assert_eq!(payload["seed"], "moky");

        assert!(matches!(
            files.import_script("/meta/none.js").await,
            Err(LoadError::NotFound(_))
        ));
        assert!(matches!(
            files.import_script("/meta/../../etc/passwd").await,
            Err(LoadError::InvalidPath(_))
        ));
    }
}
