//! Network-idle detection
//!
//! WebDriver has no notion of "network idle", so the page is sampled: it is
//! idle once `document.readyState` is `complete` and the number of resource
//! timing entries has not changed for a quiet window.

use std::time::{Duration, Instant};

/// Script returning `{ ready, resources }` for one idle sample
pub const IDLE_PROBE: &str = "return { \
    ready: document.readyState === 'complete', \
    resources: (window.performance && performance.getEntriesByType) \
        ? performance.getEntriesByType('resource').length : 0 \
};";

/// Tracks successive page samples until the page settles
#[derive(Debug)]
pub struct IdleTracker {
    quiet: Duration,
    last_count: Option<usize>,
    stable_since: Option<Instant>,
}

impl IdleTracker {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_count: None,
            stable_since: None,
        }
    }

    /// Feed one sample, returning true once the page counts as idle
    pub fn observe(&mut self, ready: bool, resources: usize, now: Instant) -> bool {
        if !ready {
            self.last_count = None;
            self.stable_since = None;
            return false;
        }

        if self.last_count != Some(resources) {
            self.last_count = Some(resources);
            self.stable_since = Some(now);
        }

        match self.stable_since {
            Some(since) => now.saturating_duration_since(since) >= self.quiet,
            None => false,
        }
    }
}
