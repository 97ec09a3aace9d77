//! Abuse Guard
//!
//! Facade composing the denylist gate, the rate limit evaluator, the
//! progressive lockout policy, and the suspicious-pattern detector behind
//! the surface the authentication handlers call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::AbuseConfig;
use crate::counter::CounterCache;
use crate::error::AbuseError;
use crate::evaluator::{LimitDecision, RateLimitEvaluator};
use crate::lockout::LockoutPolicy;
use crate::suspicious::{SuspiciousDetector, SuspiciousReport};
use reservo_types::abuse_adapter::{AbuseAdapter, DenylistEntry, OpClass};
use reservo_types::prelude::*;

/// Counters for the admin surface
#[derive(Debug, Clone, Default)]
pub struct AbuseStats {
	/// Denylist entries that are still active
	pub active_blocks: usize,
	/// Requests denied by the quota since startup
	pub total_limited: u64,
	/// Blocks issued since startup
	pub total_blocks: u64,
}

pub struct AbuseGuard {
	adapter: Arc<dyn AbuseAdapter>,
	evaluator: RateLimitEvaluator,
	lockout: LockoutPolicy,
	suspicious: SuspiciousDetector,
	config: Arc<AbuseConfig>,
	clock: Arc<dyn Clock>,
	total_limited: AtomicU64,
	total_blocks: AtomicU64,
}

impl AbuseGuard {
	/// Create a guard using the wall clock
	pub fn new(
		adapter: Arc<dyn AbuseAdapter>,
		counter: Arc<dyn CounterCache>,
		config: AbuseConfig,
	) -> Self {
		Self::with_clock(adapter, counter, config, Arc::new(SystemClock))
	}

	/// Create a guard with an injected clock (used by tests)
	pub fn with_clock(
		adapter: Arc<dyn AbuseAdapter>,
		counter: Arc<dyn CounterCache>,
		config: AbuseConfig,
		clock: Arc<dyn Clock>,
	) -> Self {
		let config = Arc::new(config);
		Self {
			evaluator: RateLimitEvaluator::new(
				adapter.clone(),
				counter,
				config.clone(),
				clock.clone(),
			),
			lockout: LockoutPolicy::new(adapter.clone(), config.clone(), clock.clone()),
			suspicious: SuspiciousDetector::new(adapter.clone(), config.clone(), clock.clone()),
			adapter,
			config,
			clock,
			total_limited: AtomicU64::new(0),
			total_blocks: AtomicU64::new(0),
		}
	}

	/// Whether `addr` currently has an active denylist entry.
	/// Expired entries read as not blocked without being deleted.
	pub async fn is_blocked(&self, addr: &str) -> AbResult<bool> {
		match self.adapter.read_denylist(addr).await? {
			Some(entry) => Ok(entry.is_active(self.clock.now())),
			None => Ok(false),
		}
	}

	/// Gate an inbound request: the denylist short-circuits before any
	/// quota is consumed, then the rate limit is evaluated. The middleware
	/// converts the error into a generic "too many attempts" response.
	pub async fn check(&self, op: OpClass, addr: &str) -> Result<LimitDecision, AbuseError> {
		let now = self.clock.now();
		if let Some(entry) = self.adapter.read_denylist(addr).await? {
			if entry.is_active(now) {
				let remaining =
					entry.expires_at.map(|exp| Duration::from_secs(exp.secs_since(now) as u64));
				return Err(AbuseError::Blocked { remaining });
			}
		}

		let decision = self.evaluator.check_limit(op, addr).await?;
		if !decision.allowed {
			self.total_limited.fetch_add(1, Ordering::Relaxed);
			return Err(AbuseError::RateLimited { op });
		}
		Ok(decision)
	}

	/// Rate limit decision without the denylist gate
	pub async fn check_limit(&self, op: OpClass, addr: &str) -> AbResult<LimitDecision> {
		self.evaluator.check_limit(op, addr).await
	}

	/// Record the outcome of an attempt in the durable log
	pub async fn record_attempt(
		&self,
		op: OpClass,
		addr: &str,
		email: Option<&str>,
		success: bool,
		failure_reason: Option<&str>,
		abuse_score: Option<f64>,
	) {
		self.evaluator.record_attempt(op, addr, email, success, failure_reason, abuse_score).await;
	}

	/// Re-evaluate recent login failures for `addr` and escalate if the
	/// threshold is reached. Returns whether a block was just applied.
	pub async fn check_and_escalate(&self, addr: &str) -> AbResult<bool> {
		let blocked = self.lockout.check_and_escalate(addr).await?;
		if blocked {
			self.total_blocks.fetch_add(1, Ordering::Relaxed);
		}
		Ok(blocked)
	}

	/// Bulk-registration signal for `addr`
	pub async fn check_suspicious(&self, addr: &str) -> AbResult<SuspiciousReport> {
		self.suspicious.check_suspicious(addr).await
	}

	/// Manually block an address (admin surface). `duration` of None is a
	/// permanent block.
	pub async fn block(&self, addr: &str, reason: &str, duration: Option<Duration>) -> AbResult<()> {
		let now = self.clock.now();
		self.adapter.upsert_denylist(addr, reason, now, duration.map(|d| now + d)).await?;
		self.total_blocks.fetch_add(1, Ordering::Relaxed);
		debug!("Blocked {} for {:?}: {}", addr, duration, reason);
		Ok(())
	}

	/// Remove the denylist entry for an address
	pub async fn unblock(&self, addr: &str) -> AbResult<()> {
		self.adapter.delete_denylist(addr).await
	}

	/// Currently active blocks
	pub async fn list_blocks(&self) -> AbResult<Vec<DenylistEntry>> {
		let now = self.clock.now();
		let entries = self.adapter.list_denylist().await?;
		Ok(entries.into_iter().filter(|e| e.is_active(now)).collect())
	}

	pub async fn stats(&self) -> AbResult<AbuseStats> {
		Ok(AbuseStats {
			active_blocks: self.list_blocks().await?.len(),
			total_limited: self.total_limited.load(Ordering::Relaxed),
			total_blocks: self.total_blocks.load(Ordering::Relaxed),
		})
	}

	/// Storage hygiene: drop attempt rows older than the lookback horizon
	/// and denylist rows that have expired. Not required for correctness.
	pub async fn run_cleanup(&self) -> AbResult<u32> {
		let now = self.clock.now();
		let attempts = self.adapter.cleanup_attempts(now - self.config.lookback_window).await?;
		let blocks = self.adapter.cleanup_denylist(now).await?;
		if attempts + blocks > 0 {
			info!("Abuse cleanup removed {} attempt rows, {} denylist rows", attempts, blocks);
		}
		Ok(attempts + blocks)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;
	use crate::counter::MemoryCounterStore;
	use crate::testing::MemoryAbuseStore;

	fn guard() -> (AbuseGuard, Arc<MemoryAbuseStore>, Arc<ManualClock>) {
		let adapter = Arc::new(MemoryAbuseStore::new());
		let clock = Arc::new(ManualClock::new(Timestamp(1_000_000)));
		let counter = Arc::new(MemoryCounterStore::new(1000, clock.clone()));
		let guard = AbuseGuard::with_clock(
			adapter.clone(),
			counter,
			AbuseConfig::default(),
			clock.clone(),
		);
		(guard, adapter, clock)
	}

	#[tokio::test]
	async fn test_block_unblock_round_trip() {
		let (guard, _, _) = guard();

		assert!(!guard.is_blocked("10.0.0.1").await.unwrap());
		guard.block("10.0.0.1", "manual", Some(Duration::from_secs(60))).await.unwrap();
		assert!(guard.is_blocked("10.0.0.1").await.unwrap());

		guard.unblock("10.0.0.1").await.unwrap();
		assert!(!guard.is_blocked("10.0.0.1").await.unwrap());
	}

	#[tokio::test]
	async fn test_blocked_address_short_circuits() {
		let (guard, _, _) = guard();
		guard.block("10.0.0.1", "manual", None).await.unwrap();

		let res = guard.check(OpClass::Login, "10.0.0.1").await;
		assert!(matches!(res, Err(AbuseError::Blocked { remaining: None })));

		// The denylist gate consumed no quota
		let decision = guard.check_limit(OpClass::Login, "10.0.0.1").await.unwrap();
		assert_eq!(decision.remaining, 9);
	}

	#[tokio::test]
	async fn test_expired_block_reads_as_unblocked() {
		let (guard, _, clock) = guard();
		guard.block("10.0.0.1", "manual", Some(Duration::from_secs(3600))).await.unwrap();
		assert!(guard.is_blocked("10.0.0.1").await.unwrap());

		clock.advance(Duration::from_secs(3601));
		assert!(!guard.is_blocked("10.0.0.1").await.unwrap());
		assert!(guard.check(OpClass::Login, "10.0.0.1").await.is_ok());
	}

	#[tokio::test]
	async fn test_check_rate_limits_after_gate() {
		let (guard, _, _) = guard();

		for _ in 0..10 {
			assert!(guard.check(OpClass::Login, "10.0.0.1").await.is_ok());
		}
		let res = guard.check(OpClass::Login, "10.0.0.1").await;
		assert!(matches!(res, Err(AbuseError::RateLimited { op: OpClass::Login })));

		let stats = guard.stats().await.unwrap();
		assert_eq!(stats.total_limited, 1);
	}

	#[tokio::test]
	async fn test_stats_and_list_blocks() {
		let (guard, _, clock) = guard();

		guard.block("10.0.0.1", "manual", Some(Duration::from_secs(60))).await.unwrap();
		guard.block("10.0.0.2", "manual", None).await.unwrap();

		let stats = guard.stats().await.unwrap();
		assert_eq!(stats.active_blocks, 2);
		assert_eq!(stats.total_blocks, 2);

		clock.advance(Duration::from_secs(61));
		assert_eq!(guard.list_blocks().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_cleanup_reclaims_expired_rows() {
		let (guard, adapter, clock) = guard();

		guard.record_attempt(OpClass::Login, "10.0.0.1", None, false, Some("bad"), None).await;
		guard.block("10.0.0.1", "manual", Some(Duration::from_secs(60))).await.unwrap();

		clock.advance(Duration::from_secs(31 * 24 * 3600));
		let removed = guard.run_cleanup().await.unwrap();
		assert_eq!(removed, 2);
		assert_eq!(adapter.attempt_rows(), 0);
	}
}

// vim: ts=4
