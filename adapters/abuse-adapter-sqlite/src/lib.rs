//! SQLite-backed abuse adapter for the Reservo platform.
//!
//! Stores the durable side of abuse prevention: the append-only attempt
//! log (the counting fallback when the fast counter path is down), the IP
//! denylist, and the append-only block history that feeds escalation-tier
//! computation.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};

use reservo::abuse_adapter::{AbuseAdapter, CreateAttempt, DenylistEntry, OpClass};
use reservo::prelude::*;

mod attempt;
mod denylist;
mod schema;
mod utils;

use schema::init_db;

#[derive(Debug)]
pub struct AbuseAdapterSqlite {
	db: SqlitePool,
}

impl AbuseAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> AbResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		init_db(&db)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl AbuseAdapter for AbuseAdapterSqlite {
	async fn create_attempt(&self, attempt: &CreateAttempt<'_>) -> AbResult<()> {
		attempt::create_attempt(&self.db, attempt).await
	}

	async fn count_attempts(
		&self,
		op: OpClass,
		addr: &str,
		since: Timestamp,
		success: Option<bool>,
	) -> AbResult<u32> {
		attempt::count_attempts(&self.db, op, addr, since, success).await
	}

	async fn upsert_denylist(
		&self,
		addr: &str,
		reason: &str,
		blocked_at: Timestamp,
		expires_at: Option<Timestamp>,
	) -> AbResult<()> {
		denylist::upsert_denylist(&self.db, addr, reason, blocked_at, expires_at).await
	}

	async fn read_denylist(&self, addr: &str) -> AbResult<Option<DenylistEntry>> {
		denylist::read_denylist(&self.db, addr).await
	}

	async fn delete_denylist(&self, addr: &str) -> AbResult<()> {
		denylist::delete_denylist(&self.db, addr).await
	}

	async fn list_denylist(&self) -> AbResult<Vec<DenylistEntry>> {
		denylist::list_denylist(&self.db).await
	}

	async fn count_block_history(&self, addr: &str, since: Timestamp) -> AbResult<u32> {
		denylist::count_block_history(&self.db, addr, since).await
	}

	async fn cleanup_attempts(&self, older_than: Timestamp) -> AbResult<u32> {
		attempt::cleanup_attempts(&self.db, older_than).await
	}

	async fn cleanup_denylist(&self, now: Timestamp) -> AbResult<u32> {
		denylist::cleanup_denylist(&self.db, now).await
	}
}

// vim: ts=4
