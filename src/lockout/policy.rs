//! Lockout policy parameters.

use std::time::Duration;

use crate::error::{Result, TurnstileError};

/// Default failed attempts before lockout.
const DEFAULT_THRESHOLD: u32 = 5;
/// Default lockout duration (also the window within which failures count).
const DEFAULT_DURATION: Duration = Duration::from_secs(5 * 60);

/// A validated lockout policy.
///
/// `duration` is both how long an account stays locked and how far back
/// failed attempts count toward the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    threshold: u32,
    duration: Duration,
}

impl LockoutPolicy {
    /// Create a new policy.
    ///
    /// Fails with [`TurnstileError::InvalidPolicy`] if the threshold is zero
    /// or the duration is shorter than one millisecond.
    pub fn new(threshold: u32, duration: Duration) -> Result<Self> {
        if threshold == 0 {
            return Err(TurnstileError::InvalidPolicy(
                "lockout threshold must be at least 1".to_string(),
            ));
        }
        if duration.as_millis() == 0 {
            return Err(TurnstileError::InvalidPolicy(
                "lockout duration must be at least 1ms".to_string(),
            ));
        }
        Ok(Self {
            threshold,
            duration,
        })
    }

    /// Failed attempts that trigger a lockout.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// How long a lockout lasts.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The lockout duration in milliseconds.
    pub fn duration_millis(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            duration: DEFAULT_DURATION,
        }
    }
}
