//! Attempt log operations

use sqlx::SqlitePool;

use crate::utils::*;
use reservo::abuse_adapter::{CreateAttempt, OpClass};
use reservo::prelude::*;

/// Append an attempt row. Rows are immutable; only the retention sweep
/// removes them.
pub(crate) async fn create_attempt(db: &SqlitePool, attempt: &CreateAttempt<'_>) -> AbResult<()> {
	sqlx::query(
		"INSERT INTO attempts (op, addr, email, success, failure_reason, abuse_score, created_at)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
	)
	.bind(attempt.op.as_str())
	.bind(attempt.addr)
	.bind(attempt.email)
	.bind(attempt.success)
	.bind(attempt.failure_reason)
	.bind(attempt.abuse_score)
	.bind(attempt.created_at.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(())
}

/// Count attempts for (op, addr) within the window, optionally filtered
/// by outcome
pub(crate) async fn count_attempts(
	db: &SqlitePool,
	op: OpClass,
	addr: &str,
	since: Timestamp,
	success: Option<bool>,
) -> AbResult<u32> {
	let count: i64 = match success {
		Some(outcome) => {
			sqlx::query_scalar(
				"SELECT COUNT(*) FROM attempts
				WHERE op = ?1 AND addr = ?2 AND created_at >= ?3 AND success = ?4",
			)
			.bind(op.as_str())
			.bind(addr)
			.bind(since.0)
			.bind(outcome)
			.fetch_one(db)
			.await
		}
		None => {
			sqlx::query_scalar(
				"SELECT COUNT(*) FROM attempts
				WHERE op = ?1 AND addr = ?2 AND created_at >= ?3",
			)
			.bind(op.as_str())
			.bind(addr)
			.bind(since.0)
			.fetch_one(db)
			.await
		}
	}
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(count as u32)
}

/// Delete attempt rows older than the retention horizon
pub(crate) async fn cleanup_attempts(db: &SqlitePool, older_than: Timestamp) -> AbResult<u32> {
	let res = sqlx::query("DELETE FROM attempts WHERE created_at < ?1")
		.bind(older_than.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	Ok(res.rows_affected() as u32)
}

// vim: ts=4
