//! Named policy instances.
//!
//! Each named policy (contact form, quote form, login, ...) gets its own
//! independently keyed limiter. Exhausting one policy for a client never
//! affects another, even when both see the same key string.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::TurnstileConfig;
use crate::error::Result;

use super::limiter::SlidingWindowLimiter;
use super::policy::Policy;

/// A set of independent rate limiters, one per named policy.
pub struct LimiterRegistry {
    limiters: HashMap<String, Arc<SlidingWindowLimiter>>,
}

impl LimiterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            limiters: HashMap::new(),
        }
    }

    /// Build a registry from configuration, using the system clock.
    ///
    /// Fails fast on any invalid policy so that bad parameters surface at
    /// startup rather than on the request path.
    pub fn from_config(config: &TurnstileConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Build a registry from configuration with an injected clock.
    pub fn from_config_with_clock(
        config: &TurnstileConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut limiters = HashMap::new();

        for (name, policy_config) in &config.policies {
            let policy = Policy::new(policy_config.limit, policy_config.window())?;
            info!(
                policy = %name,
                limit = policy.limit(),
                window_ms = policy.window_millis(),
                "Registered rate limit policy"
            );
            limiters.insert(
                name.clone(),
                Arc::new(SlidingWindowLimiter::with_clock(policy, clock.clone())),
            );
        }

        Ok(Self { limiters })
    }

    /// Register a limiter under a policy name, replacing any existing one.
    pub fn insert(&mut self, name: impl Into<String>, limiter: Arc<SlidingWindowLimiter>) {
        self.limiters.insert(name.into(), limiter);
    }

    /// Get the limiter for a named policy.
    pub fn get(&self, name: &str) -> Option<Arc<SlidingWindowLimiter>> {
        self.limiters.get(name).cloned()
    }

    /// All limiters in the registry, for the sweeper.
    pub fn limiters(&self) -> Vec<Arc<SlidingWindowLimiter>> {
        self.limiters.values().cloned().collect()
    }

    /// Number of named policies.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether the registry has no policies.
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}

impl Default for LimiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
