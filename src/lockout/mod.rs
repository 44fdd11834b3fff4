//! Account lockout after repeated authentication failures.

mod policy;
mod tracker;

pub use policy::LockoutPolicy;
pub use tracker::LockoutTracker;
