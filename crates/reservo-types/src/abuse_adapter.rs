//! Adapter that stores the durable state of the abuse-prevention subsystem:
//! the append-only attempt log, the IP denylist, and the block history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

/// The category of gated action. Each class has its own quota and
/// rolling window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpClass {
	Register,
	Login,
}

impl OpClass {
	/// Stable string form, used in counter keys and attempt rows
	pub fn as_str(&self) -> &'static str {
		match self {
			OpClass::Register => "register",
			OpClass::Login => "login",
		}
	}
}

impl std::fmt::Display for OpClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Data needed to record a login or registration attempt.
///
/// Attempt rows are immutable once written; only the retention sweep
/// removes them.
#[derive(Debug)]
pub struct CreateAttempt<'a> {
	pub op: OpClass,
	/// Origin address of the request (the rate-limiting key)
	pub addr: &'a str,
	/// Account identifier, if known (None for anonymous failures)
	pub email: Option<&'a str>,
	pub success: bool,
	pub failure_reason: Option<&'a str>,
	/// Score reported by an external verification service, if any
	pub abuse_score: Option<f64>,
	pub created_at: Timestamp,
}

/// An active or expired denylist entry. One row per address; the block
/// history table keeps the full audit line across upserts.
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenylistEntry {
	pub addr: Box<str>,
	pub reason: Box<str>,
	pub blocked_at: Timestamp,
	/// None means the block is permanent
	pub expires_at: Option<Timestamp>,
}

impl DenylistEntry {
	/// Whether this entry still blocks requests at `now`.
	/// An expired row is treated as "not blocked" without requiring deletion.
	pub fn is_active(&self, now: Timestamp) -> bool {
		self.expires_at.is_none_or(|exp| exp > now)
	}
}

/// A Reservo abuse adapter
///
/// An `AbuseAdapter` is responsible for the durable side of abuse
/// prevention: the attempt log used as the counting fallback, and the
/// denylist consulted on every inbound request. Timestamps are always
/// passed in by the caller so the core owns the clock.
#[async_trait]
pub trait AbuseAdapter: Debug + Send + Sync {
	/// Appends an attempt row. Never updates existing rows.
	async fn create_attempt(&self, attempt: &CreateAttempt<'_>) -> AbResult<()>;

	/// Counts attempt rows for (`op`, `addr`) created at or after `since`.
	/// `success` filters on the outcome column; None counts all rows.
	async fn count_attempts(
		&self,
		op: OpClass,
		addr: &str,
		since: Timestamp,
		success: Option<bool>,
	) -> AbResult<u32>;

	/// # Denylist
	/// Upserts the denylist entry for `addr` (last write wins) and appends
	/// a row to the block history.
	async fn upsert_denylist(
		&self,
		addr: &str,
		reason: &str,
		blocked_at: Timestamp,
		expires_at: Option<Timestamp>,
	) -> AbResult<()>;

	/// Reads the denylist entry for `addr`, expired or not
	async fn read_denylist(&self, addr: &str) -> AbResult<Option<DenylistEntry>>;

	/// Removes the denylist entry for `addr`
	async fn delete_denylist(&self, addr: &str) -> AbResult<()>;

	/// Lists all denylist entries, including expired ones
	async fn list_denylist(&self) -> AbResult<Vec<DenylistEntry>>;

	/// Counts block-history rows for `addr` created at or after `since`.
	/// This is the escalation-tier input.
	async fn count_block_history(&self, addr: &str, since: Timestamp) -> AbResult<u32>;

	// Retention
	async fn cleanup_attempts(&self, older_than: Timestamp) -> AbResult<u32>;
	async fn cleanup_denylist(&self, now: Timestamp) -> AbResult<u32>;
}


// vim: ts=4
