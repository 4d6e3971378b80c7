//! # Response Routes
//!
//! Path shapes of the script responses served by the relay web server, and
//! the bus matchers built from them.
//!
//! | Route      | Path                       |
//! |------------|----------------------------|
//! | `Meta`     | `/meta/{address}.js`       |
//! | `Profile`  | `/profile/{address}.js`    |
//! | `Channel`  | `/channel/{identity}.js`   |
//! | `Dwitter`  | `/dwitter/{identity}.js`   |

use crate::subscriber::Matcher;
use shared_types::Request;
use std::sync::Arc;

/// A response route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Meta documents.
    Meta,
    /// Profile documents.
    Profile,
    /// Channel feed.
    Channel,
    /// Channel feed, older path shape.
    Dwitter,
}

impl Route {
    /// The leading directory of the route.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Route::Meta => "/meta/",
            Route::Profile => "/profile/",
            Route::Channel => "/channel/",
            Route::Dwitter => "/dwitter/",
        }
    }

    /// The variable segment of `path`, if `path` belongs to this route.
    ///
    /// Meta and profile segments may not contain `.`; channel segments may
    /// not contain `/`.
    #[must_use]
    pub fn segment(self, path: &str) -> Option<&str> {
        let segment = path.strip_prefix(self.prefix())?.strip_suffix(".js")?;
        if segment.is_empty() {
            return None;
        }
        let forbidden = match self {
            Route::Meta | Route::Profile => '.',
            Route::Channel | Route::Dwitter => '/',
        };
        if segment.contains(forbidden) || segment.contains('/') {
            return None;
        }
        Some(segment)
    }

    /// True if `path` belongs to this route.
    #[must_use]
    pub fn matches(self, path: &str) -> bool {
        self.segment(path).is_some()
    }

    /// A fresh bus matcher for this route.
    ///
    /// Each call allocates a new matcher; keep the returned value to
    /// unsubscribe later.
    #[must_use]
    pub fn matcher(self) -> Matcher {
        Arc::new(move |request: &Request| self.matches(&request.path))
    }

    /// A matcher accepting either channel path shape.
    #[must_use]
    pub fn any_channel() -> Matcher {
        Arc::new(|request: &Request| {
            Route::Channel.matches(&request.path) || Route::Dwitter.matches(&request.path)
        })
    }

    /// URL of this route's document for `segment` under `base_url`.
    #[must_use]
    pub fn url(self, base_url: &str, segment: &str) -> String {
        let base = base_url.trim_end_matches('/');
        format!("{}{}{}.js", base, self.prefix(), segment)
    }
}
