//! Periodic cleanup of stale rate limit entries.
//!
//! Admission checks prune per key, so a key that stops sending requests
//! keeps its (empty or stale) entry forever. The sweeper removes those
//! entries on a timer to bound memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::limiter::SlidingWindowLimiter;

/// Handle to the background sweep task.
pub struct Sweeper {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl Sweeper {
    /// Spawn a sweep task over the given limiters.
    ///
    /// Every `interval`, each limiter drops keys whose entire history is
    /// older than `retention`. Sweeping interleaves safely with concurrent
    /// checks because entries live in a concurrent map.
    pub fn spawn(
        limiters: Vec<Arc<SlidingWindowLimiter>>,
        interval: Duration,
        retention: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let retention_millis = retention.as_millis() as u64;

        info!(
            interval_secs = interval.as_secs(),
            retention_ms = retention_millis,
            limiters = limiters.len(),
            "Starting rate limit sweeper"
        );

        // Anchor the schedule at spawn time, with the first pass one full
        // interval out. Created here rather than in the task so the tick
        // timeline does not depend on when the task is first polled.
        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut removed = 0;
                        for limiter in &limiters {
                            removed += limiter.sweep(retention_millis);
                        }
                        debug!(removed = removed, "Sweep pass complete");
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Sweeper shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            handle,
            shutdown_tx,
        }
    }

    /// Stop the sweep task and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ratelimit::Policy;

    fn limiter_with_clock(clock: Arc<ManualClock>) -> Arc<SlidingWindowLimiter> {
        let policy = Policy::new(5, Duration::from_millis(1_000)).unwrap();
        Arc::new(SlidingWindowLimiter::with_clock(policy, clock))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_stale_keys_on_interval() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter_with_clock(clock.clone());

        limiter.check("stale");
        assert_eq!(limiter.key_count(), 1);

        // Entry falls outside the retention horizon before the first sweep
        clock.advance(10_000);

        let sweeper = Sweeper::spawn(
            vec![limiter.clone()],
            Duration::from_secs(300),
            Duration::from_millis(5_000),
        );

        // Let the task register its timer before moving time forward
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(301)).await;
        // Let the sweep tick run
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(limiter.key_count(), 0);
        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_retains_recent_keys() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter_with_clock(clock.clone());

        limiter.check("stale");
        clock.advance(10_000);
        limiter.check("active");

        let sweeper = Sweeper::spawn(
            vec![limiter.clone()],
            Duration::from_secs(300),
            Duration::from_millis(5_000),
        );

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(301)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(limiter.key_count(), 1);
        assert!(limiter.check("active").allowed);
        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_shutdown_stops_task() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter_with_clock(clock);

        let sweeper = Sweeper::spawn(
            vec![limiter],
            Duration::from_secs(300),
            Duration::from_millis(5_000),
        );

        // Must resolve promptly even though the next tick is minutes away
        sweeper.shutdown().await;
    }
}
