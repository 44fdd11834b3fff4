//! Rate limit policy and admission decision types.

use std::time::Duration;

use crate::error::{Result, TurnstileError};

/// A validated requests-per-window rate limit policy.
///
/// Construction is the single validation point: a `Policy` that exists is
/// always usable, so limiters never re-check parameters at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    limit: u32,
    window: Duration,
}

impl Policy {
    /// Create a new policy.
    ///
    /// Fails with [`TurnstileError::InvalidPolicy`] if the limit is zero or
    /// the window is shorter than one millisecond.
    pub fn new(limit: u32, window: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(TurnstileError::InvalidPolicy(
                "limit must be at least 1".to_string(),
            ));
        }
        if window.as_millis() == 0 {
            return Err(TurnstileError::InvalidPolicy(
                "window must be at least 1ms".to_string(),
            ));
        }
        Ok(Self { limit, window })
    }

    /// Maximum requests admitted per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The sliding window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The window length in milliseconds.
    pub fn window_millis(&self) -> u64 {
        self.window.as_millis() as u64
    }
}

/// The outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request was admitted.
    pub allowed: bool,
    /// Requests left in the current window after this decision.
    pub remaining: u32,
    /// Epoch millisecond at which the oldest retained request exits the
    /// window. Equals the check time when no requests are retained.
    pub reset_at: u64,
}

impl Decision {
    /// How long a rejected caller should wait before retrying, measured
    /// from `now_millis`. Zero once the window has already opened up.
    pub fn retry_after(&self, now_millis: u64) -> Duration {
        Duration::from_millis(self.reset_at.saturating_sub(now_millis))
    }
}
