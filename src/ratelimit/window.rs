//! Per-key timestamp history for sliding-window admission.

use std::collections::VecDeque;

/// The recorded request timestamps for a single key.
///
/// Timestamps are epoch milliseconds appended in arrival order, so the
/// sequence is always chronologically sorted and pruning only ever pops
/// from the front.
#[derive(Debug, Default)]
pub struct WindowEntry {
    timestamps: VecDeque<u64>,
}

impl WindowEntry {
    /// Create an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every timestamp that has exited the window ending at `now`,
    /// keeping those strictly inside it.
    ///
    /// The comparison is `front + window_millis <= now` rather than
    /// `front <= now - window_millis`: near the epoch the subtraction would
    /// saturate to zero and discard a live timestamp recorded at t=0.
    pub fn prune(&mut self, now: u64, window_millis: u64) {
        while let Some(&front) = self.timestamps.front() {
            if front + window_millis > now {
                break;
            }
            self.timestamps.pop_front();
        }
    }

    /// Record an admitted request at `now`.
    pub fn record(&mut self, now: u64) {
        self.timestamps.push_back(now);
    }

    /// Number of timestamps currently retained.
    pub fn count(&self) -> usize {
        self.timestamps.len()
    }

    /// The oldest retained timestamp, if any.
    pub fn oldest(&self) -> Option<u64> {
        self.timestamps.front().copied()
    }

    /// The newest retained timestamp, if any.
    pub fn newest(&self) -> Option<u64> {
        self.timestamps.back().copied()
    }

    /// Whether this entry has seen no activity within the last
    /// `retention_millis` and is therefore eligible for removal by the
    /// sweep. Uses the same saturation-free comparison as [`prune`].
    ///
    /// [`prune`]: Self::prune
    pub fn is_idle(&self, now: u64, retention_millis: u64) -> bool {
        match self.newest() {
            Some(newest) => newest + retention_millis <= now,
            None => true,
        }
    }
}
