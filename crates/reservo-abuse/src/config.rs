//! Abuse Prevention Configuration
//!
//! All thresholds and windows in one struct, injected at construction.
//! Defaults match the documented policy; every value can be overridden
//! through `RESERVO_ABUSE_*` environment variables at startup.

use std::time::Duration;

use reservo_types::abuse_adapter::OpClass;
use reservo_types::prelude::*;

/// Main abuse prevention configuration
#[derive(Clone, Debug)]
pub struct AbuseConfig {
	/// Registrations allowed per address within `register_window`
	pub register_quota: u32,
	/// Rolling window for the registration quota
	pub register_window: Duration,
	/// Login attempts allowed per address within `login_window`
	pub login_quota: u32,
	/// Rolling window for the login quota
	pub login_window: Duration,

	/// Failed logins within `failure_window` that trigger a block
	pub failure_threshold: u32,
	/// Window over which login failures are counted
	pub failure_window: Duration,
	/// How far back prior blocks count towards the escalation tier
	pub lookback_window: Duration,
	/// Block duration per escalation tier; None is a permanent block
	pub tier_durations: [Option<Duration>; 4],

	/// Successful registrations within `suspicious_window` above which an
	/// address is flagged for review
	pub suspicious_threshold: u32,
	/// Window for the suspicious-registration signal
	pub suspicious_window: Duration,

	/// Maximum number of counter keys to track in the in-process store
	pub max_tracked_keys: usize,
}

impl Default for AbuseConfig {
	fn default() -> Self {
		Self {
			register_quota: 5,
			register_window: Duration::from_secs(24 * 3600),
			login_quota: 10,
			login_window: Duration::from_secs(15 * 60),
			failure_threshold: 5,
			failure_window: Duration::from_secs(15 * 60),
			lookback_window: Duration::from_secs(30 * 24 * 3600),
			tier_durations: [
				Some(Duration::from_secs(3600)),       // 1 hour
				Some(Duration::from_secs(24 * 3600)),  // 24 hours
				Some(Duration::from_secs(168 * 3600)), // 7 days
				None,                                  // permanent
			],
			suspicious_threshold: 3,
			suspicious_window: Duration::from_secs(24 * 3600),
			max_tracked_keys: 100_000,
		}
	}
}

impl AbuseConfig {
	/// Build a configuration from `RESERVO_ABUSE_*` environment variables,
	/// falling back to the defaults for anything unset. A set but
	/// unparseable variable is an error rather than a silent fallback.
	pub fn from_env() -> AbResult<Self> {
		let defaults = Self::default();
		Ok(Self {
			register_quota: env_u32("RESERVO_ABUSE_REGISTER_QUOTA", defaults.register_quota)?,
			register_window: env_secs("RESERVO_ABUSE_REGISTER_WINDOW_SECS", defaults.register_window)?,
			login_quota: env_u32("RESERVO_ABUSE_LOGIN_QUOTA", defaults.login_quota)?,
			login_window: env_secs("RESERVO_ABUSE_LOGIN_WINDOW_SECS", defaults.login_window)?,
			failure_threshold: env_u32("RESERVO_ABUSE_FAILURE_THRESHOLD", defaults.failure_threshold)?,
			failure_window: env_secs("RESERVO_ABUSE_FAILURE_WINDOW_SECS", defaults.failure_window)?,
			lookback_window: env_secs("RESERVO_ABUSE_LOOKBACK_SECS", defaults.lookback_window)?,
			tier_durations: env_tiers("RESERVO_ABUSE_TIER_HOURS", defaults.tier_durations)?,
			suspicious_threshold: env_u32(
				"RESERVO_ABUSE_SUSPICIOUS_THRESHOLD",
				defaults.suspicious_threshold,
			)?,
			suspicious_window: env_secs(
				"RESERVO_ABUSE_SUSPICIOUS_WINDOW_SECS",
				defaults.suspicious_window,
			)?,
			max_tracked_keys: env_usize(
				"RESERVO_ABUSE_MAX_TRACKED_KEYS",
				defaults.max_tracked_keys,
			)?,
		})
	}

	/// Quota for an operation class
	pub fn quota(&self, op: OpClass) -> u32 {
		match op {
			OpClass::Register => self.register_quota,
			OpClass::Login => self.login_quota,
		}
	}

	/// Rolling window for an operation class
	pub fn window(&self, op: OpClass) -> Duration {
		match op {
			OpClass::Register => self.register_window,
			OpClass::Login => self.login_window,
		}
	}

	/// Block duration for the next escalation, given the number of prior
	/// blocks within the lookback window. Severity never decreases: three
	/// or more prior blocks always select the permanent tier.
	pub fn tier_duration(&self, previous_blocks: u32) -> Option<Duration> {
		self.tier_durations[previous_blocks.min(3) as usize]
	}
}

fn env_u32(name: &str, default: u32) -> AbResult<u32> {
	match std::env::var(name) {
		Ok(val) => val
			.parse()
			.map_err(|_| Error::Validation(format!("{} is not a number: {}", name, val).into())),
		Err(_) => Ok(default),
	}
}

fn env_usize(name: &str, default: usize) -> AbResult<usize> {
	match std::env::var(name) {
		Ok(val) => val
			.parse()
			.map_err(|_| Error::Validation(format!("{} is not a number: {}", name, val).into())),
		Err(_) => Ok(default),
	}
}

fn env_secs(name: &str, default: Duration) -> AbResult<Duration> {
	match std::env::var(name) {
		Ok(val) => val
			.parse()
			.map(Duration::from_secs)
			.map_err(|_| Error::Validation(format!("{} is not a number: {}", name, val).into())),
		Err(_) => Ok(default),
	}
}

fn env_tiers(name: &str, default: [Option<Duration>; 4]) -> AbResult<[Option<Duration>; 4]> {
	let Ok(val) = std::env::var(name) else { return Ok(default) };
	parse_tiers(name, &val)
}

/// Parse a tier table like "1,24,168,0" (hours, 0 = permanent).
/// Exactly 4 values; anything else rejects the whole table rather than
/// half-applying it.
fn parse_tiers(name: &str, val: &str) -> AbResult<[Option<Duration>; 4]> {
	let mut tiers = [None; 4];
	let mut parts = val.split(',');
	for tier in &mut tiers {
		let part = parts
			.next()
			.ok_or_else(|| Error::Validation(format!("{} needs 4 values: {}", name, val).into()))?;
		let hours: u64 = part
			.trim()
			.parse()
			.map_err(|_| Error::Validation(format!("{} is not a number list: {}", name, val).into()))?;
		*tier = if hours == 0 { None } else { Some(Duration::from_secs(hours * 3600)) };
	}
	if parts.next().is_some() {
		return Err(Error::Validation(format!("{} needs 4 values: {}", name, val).into()));
	}
	Ok(tiers)
}


// vim: ts=4
