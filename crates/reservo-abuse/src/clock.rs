//! Clock abstraction
//!
//! Every component reads time through a [`Clock`] so that window expiry and
//! escalation behavior can be tested with a controllable clock instead of
//! sleeping.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use reservo_types::prelude::*;

/// Source of the current time
pub trait Clock: Debug + Send + Sync {
	fn now(&self) -> Timestamp;
}

/// Wall-clock implementation used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Timestamp {
		Timestamp::now()
	}
}

/// Controllable clock for tests
#[derive(Debug)]
pub struct ManualClock {
	now: AtomicI64,
}

impl ManualClock {
	pub fn new(start: Timestamp) -> Self {
		Self { now: AtomicI64::new(start.0) }
	}

	pub fn advance(&self, by: Duration) {
		self.now.fetch_add(by.as_secs() as i64, Ordering::SeqCst);
	}

	pub fn set(&self, to: Timestamp) {
		self.now.store(to.0, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Timestamp {
		Timestamp(self.now.load(Ordering::SeqCst))
	}
}


// vim: ts=4
