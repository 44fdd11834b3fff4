//! Per-account lockout tracking.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

use super::policy::LockoutPolicy;

/// An active lockout for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LockoutStatus {
    /// Epoch millisecond at which the lockout expires.
    locked_until: u64,
    /// Failure count observed when the lockout was set.
    failures_at_lockout: u32,
}

/// Failure history and lockout state for one account.
#[derive(Debug, Default)]
struct AccountState {
    /// Failure timestamps in arrival order, pruned to the lockout duration.
    failures: VecDeque<u64>,
    /// Present only while the account is locked.
    status: Option<LockoutStatus>,
}

/// Tracks failed authentication attempts per account and locks an account
/// out once the policy threshold is crossed within the lockout window.
///
/// The caller contract (see the authentication verifier): call
/// [`is_locked`](Self::is_locked) before verifying credentials and
/// short-circuit if true, [`record_failed_attempt`](Self::record_failed_attempt)
/// on every mismatch, and [`clear_attempts`](Self::clear_attempts) on every
/// success. Skipping the pre-check would let a locked account keep burning
/// attempts and never serve its lockout.
///
/// Thread-safe; accounts are independent of each other.
pub struct LockoutTracker {
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
    accounts: RwLock<HashMap<String, AccountState>>,
}

impl LockoutTracker {
    /// Create a tracker running on the system clock.
    pub fn new(policy: LockoutPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Create a tracker with an injected clock.
    pub fn with_clock(policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// The policy this tracker enforces.
    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Record a failed authentication attempt for `account`.
    ///
    /// Failures older than the lockout duration are pruned first; if the
    /// remaining count reaches the threshold, the account is locked until
    /// `now + duration`.
    pub fn record_failed_attempt(&self, account: &str) {
        let now = self.clock.now_millis();
        let duration_millis = self.policy.duration_millis();

        let mut accounts = self.accounts.write();
        let state = accounts.entry(account.to_string()).or_default();

        // Saturation-free window check: near the epoch, `now - duration`
        // would clamp to zero and discard failures recorded at t=0.
        while let Some(&front) = state.failures.front() {
            if front + duration_millis > now {
                break;
            }
            state.failures.pop_front();
        }
        state.failures.push_back(now);

        let count = state.failures.len() as u32;
        trace!(account = %account, failures = count, "Recorded failed attempt");

        if count >= self.policy.threshold() {
            let locked_until = now + self.policy.duration_millis();
            state.status = Some(LockoutStatus {
                locked_until,
                failures_at_lockout: count,
            });
            debug!(
                account = %account,
                failures = count,
                locked_until = locked_until,
                "Account locked out"
            );
        }
    }

    /// Whether `account` is currently locked out.
    ///
    /// An expired lockout is cleared as a side effect (failure history
    /// included, so a fresh attempt cycle begins) and `false` is returned.
    pub fn is_locked(&self, account: &str) -> bool {
        let now = self.clock.now_millis();

        // Fast path: no state, or an unexpired lock, needs no mutation.
        {
            let accounts = self.accounts.read();
            match accounts.get(account).and_then(|s| s.status) {
                None => return false,
                Some(status) if now < status.locked_until => return true,
                Some(_) => {}
            }
        }

        let mut accounts = self.accounts.write();
        // Re-check under the write lock; another caller may have cleared
        // or re-locked in between.
        match accounts.get(account).and_then(|s| s.status) {
            None => false,
            Some(status) if now < status.locked_until => true,
            Some(_) => {
                debug!(account = %account, "Lockout expired, clearing");
                accounts.remove(account);
                false
            }
        }
    }

    /// Remove all state for `account`. Called on successful authentication.
    pub fn clear_attempts(&self, account: &str) {
        let mut accounts = self.accounts.write();
        if accounts.remove(account).is_some() {
            debug!(account = %account, "Cleared attempt history");
        }
    }

    /// Time left on an active lockout, zero when not locked.
    pub fn remaining_lockout(&self, account: &str) -> Duration {
        let now = self.clock.now_millis();
        let accounts = self.accounts.read();
        match accounts.get(account).and_then(|s| s.status) {
            Some(status) if now < status.locked_until => {
                Duration::from_millis(status.locked_until - now)
            }
            _ => Duration::ZERO,
        }
    }

    /// Failed attempts currently on record for `account`, for diagnostics.
    pub fn failed_attempts(&self, account: &str) -> u32 {
        let accounts = self.accounts.read();
        accounts
            .get(account)
            .map(|s| s.failures.len() as u32)
            .unwrap_or(0)
    }
}
