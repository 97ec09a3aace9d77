//! Denylist and block history operations

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use reservo::abuse_adapter::DenylistEntry;
use reservo::prelude::*;

fn row_to_entry(row: &SqliteRow) -> Result<DenylistEntry, sqlx::Error> {
	Ok(DenylistEntry {
		addr: row.try_get::<String, _>("addr")?.into(),
		reason: row.try_get::<String, _>("reason")?.into(),
		blocked_at: Timestamp(row.try_get("blocked_at")?),
		expires_at: row.try_get::<Option<i64>, _>("expires_at")?.map(Timestamp),
	})
}

/// Upsert the denylist entry for an address (last write wins) and append
/// the block to the history
pub(crate) async fn upsert_denylist(
	db: &SqlitePool,
	addr: &str,
	reason: &str,
	blocked_at: Timestamp,
	expires_at: Option<Timestamp>,
) -> AbResult<()> {
	let mut tx = db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;

	sqlx::query(
		"INSERT INTO denylist (addr, reason, blocked_at, expires_at) VALUES (?1, ?2, ?3, ?4)
		ON CONFLICT(addr) DO UPDATE SET
			reason = excluded.reason,
			blocked_at = excluded.blocked_at,
			expires_at = excluded.expires_at,
			updated_at = unixepoch()",
	)
	.bind(addr)
	.bind(reason)
	.bind(blocked_at.0)
	.bind(expires_at.map(|e| e.0))
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	sqlx::query(
		"INSERT INTO denylist_history (addr, reason, blocked_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
	)
	.bind(addr)
	.bind(reason)
	.bind(blocked_at.0)
	.bind(expires_at.map(|e| e.0))
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok(())
}

/// Read the denylist entry for an address, expired or not
pub(crate) async fn read_denylist(db: &SqlitePool, addr: &str) -> AbResult<Option<DenylistEntry>> {
	let row = sqlx::query("SELECT addr, reason, blocked_at, expires_at FROM denylist WHERE addr = ?1")
		.bind(addr)
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	match row {
		Some(ref row) => Ok(Some(row_to_entry(row).inspect_err(inspect).or(Err(Error::DbError))?)),
		None => Ok(None),
	}
}

/// Remove the denylist entry for an address. The history keeps its rows.
pub(crate) async fn delete_denylist(db: &SqlitePool, addr: &str) -> AbResult<()> {
	sqlx::query("DELETE FROM denylist WHERE addr = ?1")
		.bind(addr)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	Ok(())
}

/// List all denylist entries, including expired ones
pub(crate) async fn list_denylist(db: &SqlitePool) -> AbResult<Vec<DenylistEntry>> {
	let rows = sqlx::query(
		"SELECT addr, reason, blocked_at, expires_at FROM denylist ORDER BY blocked_at DESC",
	)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	let mut entries = Vec::with_capacity(rows.len());
	for row in &rows {
		entries.push(row_to_entry(row).inspect_err(inspect).or(Err(Error::DbError))?);
	}
	Ok(entries)
}

/// Count block-history rows for an address within the lookback window
pub(crate) async fn count_block_history(
	db: &SqlitePool,
	addr: &str,
	since: Timestamp,
) -> AbResult<u32> {
	let count: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM denylist_history WHERE addr = ?1 AND blocked_at >= ?2",
	)
	.bind(addr)
	.bind(since.0)
	.fetch_one(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(count as u32)
}

/// Delete denylist rows whose expiry has passed. Permanent blocks are
/// never touched.
pub(crate) async fn cleanup_denylist(db: &SqlitePool, now: Timestamp) -> AbResult<u32> {
	let res = sqlx::query("DELETE FROM denylist WHERE expires_at IS NOT NULL AND expires_at <= ?1")
		.bind(now.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	Ok(res.rows_affected() as u32)
}

// vim: ts=4
