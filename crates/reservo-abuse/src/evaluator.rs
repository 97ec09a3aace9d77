//! Rate Limit Evaluator
//!
//! Decides per origin address and operation class whether a new attempt is
//! allowed. The fast counter cache is the primary path; when it is
//! unreachable the evaluator recomputes the count from the durable attempt
//! log without writing anything.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::AbuseConfig;
use crate::counter::{CounterCache, CounterError};
use reservo_types::abuse_adapter::{AbuseAdapter, CreateAttempt, OpClass};
use reservo_types::prelude::*;

/// Outcome of a limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitDecision {
	pub allowed: bool,
	/// Attempts left in the current window after this one
	pub remaining: u32,
}

pub struct RateLimitEvaluator {
	adapter: Arc<dyn AbuseAdapter>,
	counter: Arc<dyn CounterCache>,
	config: Arc<AbuseConfig>,
	clock: Arc<dyn Clock>,
}

impl RateLimitEvaluator {
	pub fn new(
		adapter: Arc<dyn AbuseAdapter>,
		counter: Arc<dyn CounterCache>,
		config: Arc<AbuseConfig>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self { adapter, counter, config, clock }
	}

	/// Check whether `addr` may perform another `op` attempt.
	///
	/// The primary path increments the counter cache; the fallback path is
	/// a read-only count over the attempt log, taken only when the cache is
	/// closed or unreachable. Any other cache failure surfaces to the
	/// caller.
	pub async fn check_limit(&self, op: OpClass, addr: &str) -> AbResult<LimitDecision> {
		let quota = self.config.quota(op);
		let window = self.config.window(op);

		if self.counter.is_open() {
			match self.counter.incr(&counter_key(op, addr), window).await {
				Ok(count) => return Ok(decide(count, quota)),
				Err(CounterError::Unavailable) => {
					warn!("Counter cache unavailable, counting {} from attempt log for {}", op, addr);
				}
				Err(err) => {
					warn!("Counter cache failure for {}: {}", addr, err);
					return Err(err.into());
				}
			}
		} else {
			debug!("Counter cache closed, counting {} from attempt log for {}", op, addr);
		}

		// Fallback: count recorded attempts in the same window. Nothing is
		// written here; the caller records the attempt once its outcome is
		// known. The in-flight attempt is added to the recorded count so
		// both paths compare the same quantity against the quota.
		let since = self.clock.now() - window;
		let success = match op {
			OpClass::Register => Some(true),
			OpClass::Login => None,
		};
		let recorded = self.adapter.count_attempts(op, addr, since, success).await?;
		Ok(decide(u64::from(recorded) + 1, quota))
	}

	/// Append an attempt row to the durable log. Write failures are logged
	/// and swallowed: a missed audit row must not block the flow.
	pub async fn record_attempt(
		&self,
		op: OpClass,
		addr: &str,
		email: Option<&str>,
		success: bool,
		failure_reason: Option<&str>,
		abuse_score: Option<f64>,
	) {
		let attempt = CreateAttempt {
			op,
			addr,
			email,
			success,
			failure_reason,
			abuse_score,
			created_at: self.clock.now(),
		};

		if let Err(err) = self.adapter.create_attempt(&attempt).await {
			warn!("Failed to record {} attempt for {}: {}", op, addr, err);
		}
	}
}

/// Counter cache key for (operation class, origin address)
fn counter_key(op: OpClass, addr: &str) -> String {
	format!("rl:{}:{}", op, addr)
}

/// `count` includes the attempt being evaluated
fn decide(count: u64, quota: u32) -> LimitDecision {
	let used = count.min(u64::from(quota)) as u32;
	LimitDecision { allowed: count <= u64::from(quota), remaining: quota - used }
}


// vim: ts=4
