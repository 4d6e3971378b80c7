//! # Metadata Cache/Fetcher (dw-03)
//!
//! Per-identity cache of meta and profile documents. A miss issues a fetch
//! of `{base_url}meta/{address}.js` (or `profile/...`) through the
//! `ScriptRequester` port, at most once per identity every 300 seconds.
//!
//! ```text
//! get_meta(id) ──hit──→ Some(meta)
//!      │
//!      └─miss─→ QueryHistory::should_query? ──yes──→ ScriptRequester::request(url)
//!
//! PredicateBus ──/meta/{id}.js──→ on_meta_response ──stored──→ NotificationCenter
//!                                                              (MetaReceived)
//! ```
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): cache, query history, errors
//! - **Ports Layer** (`ports/`): `MetadataApi` (inbound), `ScriptRequester`
//!   and `TimeSource` (outbound)
//! - **Service** (`service.rs`): `MetadataService`
//! - **Adapters Layer** (`adapters/`): bus registration, system clock

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{MetadataBusAdapter, SystemTimeSource};
pub use domain::{DocumentCache, MetadataConfig, MetadataError, QueryHistory};
pub use ports::{MetadataApi, ScriptRequester, TimeSource};
pub use service::MetadataService;
