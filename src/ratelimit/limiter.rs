//! Core sliding-window rate limiter implementation.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

use super::policy::{Decision, Policy};
use super::window::WindowEntry;

/// A sliding-window rate limiter for one named policy.
///
/// Tracks recent request timestamps per key and admits or rejects each new
/// request against the policy's `(limit, window)`. Each limiter owns its own
/// keyspace; two limiters never share state, even for identical key strings.
///
/// This struct is thread-safe and can be shared across tasks. Per-key
/// mutation happens under the map shard lock, so a check for one key and a
/// concurrent sweep never interleave destructively.
pub struct SlidingWindowLimiter {
    /// The policy this limiter enforces.
    policy: Policy,
    /// Time source for all decisions.
    clock: Arc<dyn Clock>,
    /// Request histories indexed by client key.
    entries: DashMap<String, WindowEntry>,
}

impl SlidingWindowLimiter {
    /// Create a limiter running on the system clock.
    pub fn new(policy: Policy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Create a limiter with an injected clock.
    pub fn with_clock(policy: Policy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            entries: DashMap::new(),
        }
    }

    /// The policy this limiter enforces.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Check whether a request for `key` is admitted.
    ///
    /// Prunes the key's history to the current window, admits if the pruned
    /// count is under the limit, and records the request timestamp only on
    /// admission. Unknown keys get a fresh history; a check never fails.
    pub fn check(&self, key: &str) -> Decision {
        let now = self.clock.now_millis();
        let window_millis = self.policy.window_millis();
        let limit = self.policy.limit();

        trace!(key = %key, now = now, "Checking rate limit");

        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| {
            debug!(key = %key, limit = limit, window_ms = window_millis, "Creating rate limit entry");
            WindowEntry::new()
        });

        entry.prune(now, window_millis);

        let allowed = (entry.count() as u32) < limit;
        if allowed {
            entry.record(now);
        } else {
            debug!(key = %key, limit = limit, "Rate limit exceeded");
        }

        let count = entry.count() as u32;
        let remaining = limit.saturating_sub(count);
        let reset_at = entry
            .oldest()
            .map(|oldest| oldest + window_millis)
            .unwrap_or(now);

        Decision {
            allowed,
            remaining,
            reset_at,
        }
    }

    /// Remove every key whose entire history is older than `retention`
    /// milliseconds, returning the number of keys removed.
    ///
    /// Called periodically by the [`super::Sweeper`] to bound memory.
    pub fn sweep(&self, retention_millis: u64) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_idle(now, retention_millis));

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed = removed, "Swept stale rate limit entries");
        }
        removed
    }

    /// Clear all keys.
    pub fn reset(&self) {
        self.entries.clear();
    }

    /// Number of keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    fn limiter(limit: u32, window_ms: u64, clock: Arc<ManualClock>) -> SlidingWindowLimiter {
        let policy = Policy::new(limit, Duration::from_millis(window_ms)).unwrap();
        SlidingWindowLimiter::with_clock(policy, clock)
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let clock = Arc::new(ManualClock::new(1_000));
        let limiter = limiter(3, 60_000, clock);

        for _ in 0..3 {
            assert!(limiter.check("user1").allowed);
        }

        let decision = limiter.check("user1");
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let clock = Arc::new(ManualClock::new(1_000));
        let limiter = limiter(3, 60_000, clock);

        let first = limiter.check("user1");
        assert!(first.allowed);
        assert_eq!(first.remaining, 2);

        let second = limiter.check("user1");
        assert!(second.allowed);
        assert_eq!(second.remaining, 1);

        let third = limiter.check("user1");
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);

        let fourth = limiter.check("user1");
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);
    }

    #[test]
    fn test_reset_at_tracks_oldest_timestamp() {
        let clock = Arc::new(ManualClock::new(1_000));
        let limiter = limiter(3, 60_000, clock.clone());

        limiter.check("user1");
        clock.advance(250);
        let decision = limiter.check("user1");

        // Oldest admitted request was at t=1000
        assert_eq!(decision.reset_at, 1_000 + 60_000);
    }

    #[test]
    fn test_reset_at_follows_pruned_history() {
        let clock = Arc::new(ManualClock::new(5_000));
        let limiter = limiter(1, 100, clock.clone());

        limiter.check("user1");
        clock.advance(150);

        // The old timestamp pruned out, so reset_at comes from the new one
        let decision = limiter.check("user1");
        assert!(decision.allowed);
        assert_eq!(decision.reset_at, 5_150 + 100);
    }

    #[test]
    fn test_window_slides_past_old_requests() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(2, 100, clock.clone());

        assert!(limiter.check("user1").allowed);
        assert!(limiter.check("user1").allowed);
        assert!(!limiter.check("user1").allowed);

        clock.advance(150);
        assert!(limiter.check("user1").allowed);
    }

    #[test]
    fn test_rejection_does_not_consume_quota() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(2, 100, clock.clone());

        assert!(limiter.check("user1").allowed);
        assert!(limiter.check("user1").allowed);

        // Hammering while exhausted must not push the window forward
        clock.advance(50);
        assert!(!limiter.check("user1").allowed);
        clock.advance(60);
        assert!(limiter.check("user1").allowed);
    }

    #[test]
    fn test_exhaustion_holds_near_epoch() {
        // A clock starting at zero must not prune live timestamps: with
        // now < window, the window simply extends back past the epoch.
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(2, 60_000, clock.clone());

        assert!(limiter.check("user1").allowed);
        assert!(limiter.check("user1").allowed);
        assert!(!limiter.check("user1").allowed);

        clock.advance(59_999);
        assert!(!limiter.check("user1").allowed);

        // The t=0 admission exits the window exactly at t=60000
        clock.advance(1);
        assert!(limiter.check("user1").allowed);
    }

    #[test]
    fn test_sweep_keeps_recent_keys_near_epoch() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(5, 1_000, clock.clone());

        limiter.check("fresh");
        clock.advance(100);

        assert_eq!(limiter.sweep(5_000), 0);
        assert_eq!(limiter.key_count(), 1);
    }

    #[test]
    fn test_keys_are_isolated() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(1, 60_000, clock);

        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn test_reset_clears_all_keys() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(1, 60_000, clock);

        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert_eq!(limiter.key_count(), 1);

        limiter.reset();
        assert_eq!(limiter.key_count(), 0);
        assert!(limiter.check("a").allowed);
    }

    #[test]
    fn test_sweep_removes_idle_keys_only() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(5, 1_000, clock.clone());

        limiter.check("stale");
        clock.advance(10_000);
        limiter.check("active");

        let removed = limiter.sweep(5_000);
        assert_eq!(removed, 1);
        assert_eq!(limiter.key_count(), 1);

        // The surviving key still admits
        assert!(limiter.check("active").allowed);
    }
}
