//! # Query History
//!
//! Remembers when each key may be queried again. A key is queried at most
//! once per window; a query attempted inside the window is suppressed.
//!
//! Expired entries are collected lazily every `gc_interval_secs`.

use std::collections::HashMap;

/// Per-key refetch suppression.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    /// key -> earliest time (unix secs) the next query is allowed.
    expires: HashMap<String, u64>,

    /// Suppression window in seconds.
    window_secs: u64,

    /// Last garbage collection timestamp.
    last_gc: u64,

    /// Garbage collection interval in seconds.
    gc_interval_secs: u64,
}

impl QueryHistory {
    /// Default suppression window: five minutes.
    pub const DEFAULT_WINDOW: u64 = 300;

    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL: u64 = 60;

    /// History with the default window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_WINDOW)
    }

    /// History with a custom window.
    #[must_use]
    pub fn with_window(window_secs: u64) -> Self {
        Self {
            expires: HashMap::new(),
            window_secs,
            last_gc: 0,
            gc_interval_secs: Self::DEFAULT_GC_INTERVAL,
        }
    }

    /// Window length in seconds.
    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Decide whether `key` may be queried at `now`.
    ///
    /// Returns `true` and opens a new window when allowed, `false` while the
    /// previous window is still open.
    pub fn should_query(&mut self, key: &str, now: u64) -> bool {
        if now.saturating_sub(self.last_gc) > self.gc_interval_secs {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        if let Some(&expires) = self.expires.get(key) {
            if now < expires {
                return false;
            }
        }
        self.expires
            .insert(key.to_string(), now.saturating_add(self.window_secs));
        true
    }

    /// When `key` may next be queried, if a window is open.
    pub fn expires_at(&self, key: &str) -> Option<u64> {
        self.expires.get(key).copied()
    }

    /// Close the window for `key` early.
    pub fn forget(&mut self, key: &str) {
        self.expires.remove(key);
    }

    /// Drop every window that has closed by `now`.
    pub fn garbage_collect(&mut self, now: u64) {
        self.expires.retain(|_, &mut expires| now < expires);
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.expires.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.expires.is_empty()
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new()
    }
}
