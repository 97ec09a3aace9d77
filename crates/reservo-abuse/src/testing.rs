//! In-memory test doubles shared by the unit tests

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use reservo_types::abuse_adapter::{AbuseAdapter, CreateAttempt, DenylistEntry, OpClass};
use reservo_types::prelude::*;

#[derive(Debug)]
struct AttemptRow {
	op: OpClass,
	addr: String,
	success: bool,
	created_at: Timestamp,
}

#[derive(Debug, Default)]
struct State {
	attempts: Vec<AttemptRow>,
	denylist: HashMap<String, DenylistEntry>,
	history: Vec<(String, Timestamp)>,
}

/// In-memory `AbuseAdapter` with the same observable behavior as the
/// SQLite adapter
#[derive(Debug, Default)]
pub(crate) struct MemoryAbuseStore {
	state: Mutex<State>,
}

impl MemoryAbuseStore {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn attempt_rows(&self) -> usize {
		self.state.lock().attempts.len()
	}

	/// Seed a prior block without touching the denylist table
	pub(crate) fn seed_history(&self, addr: &str, at: Timestamp) {
		self.state.lock().history.push((addr.to_string(), at));
	}
}

#[async_trait]
impl AbuseAdapter for MemoryAbuseStore {
	async fn create_attempt(&self, attempt: &CreateAttempt<'_>) -> AbResult<()> {
		self.state.lock().attempts.push(AttemptRow {
			op: attempt.op,
			addr: attempt.addr.to_string(),
			success: attempt.success,
			created_at: attempt.created_at,
		});
		Ok(())
	}

	async fn count_attempts(
		&self,
		op: OpClass,
		addr: &str,
		since: Timestamp,
		success: Option<bool>,
	) -> AbResult<u32> {
		let count = self
			.state
			.lock()
			.attempts
			.iter()
			.filter(|row| {
				row.op == op
					&& row.addr == addr
					&& row.created_at >= since
					&& success.is_none_or(|want| row.success == want)
			})
			.count();
		Ok(count as u32)
	}

	async fn upsert_denylist(
		&self,
		addr: &str,
		reason: &str,
		blocked_at: Timestamp,
		expires_at: Option<Timestamp>,
	) -> AbResult<()> {
		let mut state = self.state.lock();
		state.denylist.insert(
			addr.to_string(),
			DenylistEntry {
				addr: addr.into(),
				reason: reason.into(),
				blocked_at,
				expires_at,
			},
		);
		state.history.push((addr.to_string(), blocked_at));
		Ok(())
	}

	async fn read_denylist(&self, addr: &str) -> AbResult<Option<DenylistEntry>> {
		Ok(self.state.lock().denylist.get(addr).cloned())
	}

	async fn delete_denylist(&self, addr: &str) -> AbResult<()> {
		self.state.lock().denylist.remove(addr);
		Ok(())
	}

	async fn list_denylist(&self) -> AbResult<Vec<DenylistEntry>> {
		Ok(self.state.lock().denylist.values().cloned().collect())
	}

	async fn count_block_history(&self, addr: &str, since: Timestamp) -> AbResult<u32> {
		let count = self
			.state
			.lock()
			.history
			.iter()
			.filter(|(a, at)| a == addr && *at >= since)
			.count();
		Ok(count as u32)
	}

	async fn cleanup_attempts(&self, older_than: Timestamp) -> AbResult<u32> {
		let mut state = self.state.lock();
		let before = state.attempts.len();
		state.attempts.retain(|row| row.created_at >= older_than);
		Ok((before - state.attempts.len()) as u32)
	}

	async fn cleanup_denylist(&self, now: Timestamp) -> AbResult<u32> {
		let mut state = self.state.lock();
		let before = state.denylist.len();
		state.denylist.retain(|_, entry| entry.is_active(now));
		Ok((before - state.denylist.len()) as u32)
	}
}

// vim: ts=4
