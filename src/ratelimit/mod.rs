//! Sliding-window rate limiting and state management.

mod backend;
mod limiter;
mod policy;
mod registry;
mod sweeper;
mod window;

pub use backend::AdmissionBackend;
pub use limiter::SlidingWindowLimiter;
pub use policy::{Decision, Policy};
pub use registry::LimiterRegistry;
pub use sweeper::Sweeper;
pub use window::WindowEntry;
