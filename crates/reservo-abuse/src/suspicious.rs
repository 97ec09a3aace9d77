//! Suspicious Pattern Detector
//!
//! Flags an origin address that has produced abnormally many successful
//! registrations within the rolling window. This is a read-only signal for
//! manual review or additional verification; it never blocks by itself.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::config::AbuseConfig;
use reservo_types::abuse_adapter::{AbuseAdapter, OpClass};
use reservo_types::prelude::*;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousReport {
	pub suspicious: bool,
	/// Successful registrations from the address within the window
	pub count: u32,
}

pub struct SuspiciousDetector {
	adapter: Arc<dyn AbuseAdapter>,
	config: Arc<AbuseConfig>,
	clock: Arc<dyn Clock>,
}

impl SuspiciousDetector {
	pub fn new(adapter: Arc<dyn AbuseAdapter>, config: Arc<AbuseConfig>, clock: Arc<dyn Clock>) -> Self {
		Self { adapter, config, clock }
	}

	pub async fn check_suspicious(&self, addr: &str) -> AbResult<SuspiciousReport> {
		let since = self.clock.now() - self.config.suspicious_window;
		let count = self
			.adapter
			.count_attempts(OpClass::Register, addr, since, Some(true))
			.await?;
		let suspicious = count > self.config.suspicious_threshold;

		if suspicious {
			warn!("Suspicious registration pattern from {}: {} accounts in window", addr, count);
		}

		Ok(SuspiciousReport { suspicious, count })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;
	use crate::testing::MemoryAbuseStore;
	use reservo_types::abuse_adapter::CreateAttempt;
	use std::time::Duration;

	fn detector() -> (SuspiciousDetector, Arc<MemoryAbuseStore>, Arc<ManualClock>) {
		let adapter = Arc::new(MemoryAbuseStore::new());
		let clock = Arc::new(ManualClock::new(Timestamp(1_000_000)));
		let detector =
			SuspiciousDetector::new(adapter.clone(), Arc::new(AbuseConfig::default()), clock.clone());
		(detector, adapter, clock)
	}

	async fn register(adapter: &MemoryAbuseStore, addr: &str, success: bool, at: Timestamp) {
		adapter
			.create_attempt(&CreateAttempt {
				op: OpClass::Register,
				addr,
				email: Some("user@example.com"),
				success,
				failure_reason: None,
				abuse_score: None,
				created_at: at,
			})
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_three_registrations_not_suspicious() {
		let (detector, adapter, clock) = detector();
		for _ in 0..3 {
			register(&adapter, "10.0.0.1", true, clock.now()).await;
		}

		let report = detector.check_suspicious("10.0.0.1").await.unwrap();
		assert!(!report.suspicious);
		assert_eq!(report.count, 3);
	}

	#[tokio::test]
	async fn test_four_registrations_suspicious() {
		let (detector, adapter, clock) = detector();
		for _ in 0..4 {
			register(&adapter, "10.0.0.1", true, clock.now()).await;
		}

		let report = detector.check_suspicious("10.0.0.1").await.unwrap();
		assert!(report.suspicious);
		assert_eq!(report.count, 4);
	}

	#[tokio::test]
	async fn test_failed_registrations_not_counted() {
		let (detector, adapter, clock) = detector();
		for _ in 0..10 {
			register(&adapter, "10.0.0.1", false, clock.now()).await;
		}

		let report = detector.check_suspicious("10.0.0.1").await.unwrap();
		assert!(!report.suspicious);
		assert_eq!(report.count, 0);
	}

	#[tokio::test]
	async fn test_registrations_age_out_of_window() {
		let (detector, adapter, clock) = detector();
		for _ in 0..4 {
			register(&adapter, "10.0.0.1", true, clock.now()).await;
		}
		clock.advance(Duration::from_secs(24 * 3600 + 1));

		let report = detector.check_suspicious("10.0.0.1").await.unwrap();
		assert!(!report.suspicious);
		assert_eq!(report.count, 0);
	}
}

// vim: ts=4
