//! Turnstile - In-Process Admission Control
//!
//! This crate implements the admission-control core of a form-driven web
//! application: a sliding-window rate limiter for keyed resources (contact
//! forms, quote requests, login attempts) and an account lockout tracker
//! that temporarily denies authentication after repeated failures.
//!
//! All state is in-memory and single-instance. Multi-instance deployments
//! need a shared backing store; the [`ratelimit::AdmissionBackend`] trait is
//! the seam for plugging one in.

pub mod clock;
pub mod config;
pub mod error;
pub mod lockout;
pub mod ratelimit;
