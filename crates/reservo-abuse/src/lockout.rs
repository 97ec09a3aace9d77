//! Progressive Lockout Policy
//!
//! Escalates block durations for repeat offenders. A burst of failed logins
//! within the failure window triggers a block whose duration is selected by
//! the number of prior blocks within the lookback horizon:
//! 1 hour, 24 hours, 7 days, then permanent.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::AbuseConfig;
use reservo_types::abuse_adapter::{AbuseAdapter, OpClass};
use reservo_types::prelude::*;

pub struct LockoutPolicy {
	adapter: Arc<dyn AbuseAdapter>,
	config: Arc<AbuseConfig>,
	clock: Arc<dyn Clock>,
}

impl LockoutPolicy {
	pub fn new(adapter: Arc<dyn AbuseAdapter>, config: Arc<AbuseConfig>, clock: Arc<dyn Clock>) -> Self {
		Self { adapter, config, clock }
	}

	/// Re-evaluate the failure count for `addr` and apply a block if the
	/// threshold is reached. Returns whether a block was just applied.
	///
	/// The failure window is independent of (and much shorter than) the
	/// lookback horizon: a fresh burst of failures escalates even when the
	/// previous block is weeks old. Denylist write failures propagate.
	pub async fn check_and_escalate(&self, addr: &str) -> AbResult<bool> {
		let now = self.clock.now();

		let failures = self
			.adapter
			.count_attempts(OpClass::Login, addr, now - self.config.failure_window, Some(false))
			.await?;
		if failures < self.config.failure_threshold {
			return Ok(false);
		}

		let previous = self
			.adapter
			.count_block_history(addr, now - self.config.lookback_window)
			.await?;
		let duration = self.config.tier_duration(previous);
		let expires_at = duration.map(|d| now + d);

		let reason = format!(
			"{} failed login attempts within {} minutes",
			failures,
			self.config.failure_window.as_secs() / 60
		);
		self.adapter.upsert_denylist(addr, &reason, now, expires_at).await?;

		match duration {
			Some(d) => info!(
				"Blocked {} for {} hours ({} prior blocks in lookback)",
				addr,
				d.as_secs() / 3600,
				previous
			),
			None => warn!("Blocked {} permanently ({} prior blocks in lookback)", addr, previous),
		}

		Ok(true)
	}
}


// vim: ts=4
