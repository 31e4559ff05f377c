//! Time-windowed deduplication set.
//!
//! Maps a key to the instant its window expires. Expired keys are pruned
//! lazily when touched, or in bulk by [`RecencyWindow::sweep`].

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Remembers keys for a fixed window after they are marked.
#[derive(Debug, Clone)]
pub struct RecencyWindow<K> {
    window: Duration,
    expiries: HashMap<K, Instant>,
}

impl<K: Eq + Hash> RecencyWindow<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            expiries: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True if `key` was marked less than one window before `now`.
    pub fn contains(&self, key: &K, now: Instant) -> bool {
        self.expiries.get(key).is_some_and(|expiry| *expiry > now)
    }

    /// Mark `key` unless it is still inside its window.
    ///
    /// Returns true when the key was not recent (and is now marked),
    /// false when it was suppressed. A suppressed key keeps its original
    /// expiry.
    pub fn mark(&mut self, key: K, now: Instant) -> bool {
        let expiry = now + self.window;
        match self.expiries.get_mut(&key) {
            Some(existing) if *existing > now => false,
            Some(existing) => {
                *existing = expiry;
                true
            }
            None => {
                self.expiries.insert(key, expiry);
                true
            }
        }
    }

    /// Drop every expired key. Returns how many were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.expiries.len();
        self.expiries.retain(|_, expiry| *expiry > now);
        before - self.expiries.len()
    }

    /// Keys currently tracked, expired or not.
    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}
