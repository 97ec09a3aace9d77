//! Abuse prevention for the Reservo platform.
//!
//! Protects the registration and login endpoints against automated abuse:
//! fixed-window rate limiting with a fast counter path and a durable
//! fallback, progressive lockout with escalating block durations, and a
//! suspicious-pattern signal for bulk registrations. The HTTP layer calls
//! into [`AbuseGuard`]; durable state lives behind the
//! [`reservo_types::abuse_adapter::AbuseAdapter`] seam.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod counter;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod lockout;
pub mod suspicious;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AbuseConfig;
pub use counter::{CounterCache, CounterError, MemoryCounterStore};
pub use error::AbuseError;
pub use evaluator::{LimitDecision, RateLimitEvaluator};
pub use guard::{AbuseGuard, AbuseStats};
pub use lockout::LockoutPolicy;
pub use suspicious::{SuspiciousDetector, SuspiciousReport};

// vim: ts=4
