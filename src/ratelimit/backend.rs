//! Admission backend trait for abstracting over store implementations.

use async_trait::async_trait;

use super::policy::Decision;
use super::SlidingWindowLimiter;

/// Trait for admission-control backends.
///
/// The in-memory [`SlidingWindowLimiter`] is the default, single-instance
/// implementation. Deployments running multiple instances need a shared
/// atomic store (e.g. a key-value store with compare-and-swap); this trait
/// is the seam for plugging one in without touching callers.
#[async_trait]
pub trait AdmissionBackend: Send + Sync {
    /// Check whether a request for `key` is admitted.
    async fn check(&self, key: &str) -> Decision;
}

#[async_trait]
impl AdmissionBackend for SlidingWindowLimiter {
    async fn check(&self, key: &str) -> Decision {
        SlidingWindowLimiter::check(self, key)
    }
}
