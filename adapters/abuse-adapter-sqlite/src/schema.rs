//! Database schema initialization and migrations

use sqlx::{Sqlite, SqlitePool, Transaction};

/// Get the current database version from vars table
async fn get_db_version(tx: &mut Transaction<'_, Sqlite>) -> i64 {
	sqlx::query_scalar::<_, String>("SELECT value FROM vars WHERE key = 'db_version'")
		.fetch_optional(&mut **tx)
		.await
		.ok()
		.flatten()
		.and_then(|v| v.parse().ok())
		.unwrap_or(0)
}

/// Set the database version in vars table
async fn set_db_version(tx: &mut Transaction<'_, Sqlite>, version: i64) {
	let _ = sqlx::query("INSERT OR REPLACE INTO vars (key, value) VALUES ('db_version', ?)")
		.bind(version.to_string())
		.execute(&mut **tx)
		.await;
}

// Current schema version - update this when adding new migrations
const CURRENT_DB_VERSION: i64 = 1;

/// Initialize the database schema and run migrations
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Create vars table first (needed for version tracking)
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS vars (
			key text NOT NULL,
			value text NOT NULL,
			created_at INTEGER DEFAULT (unixepoch()),
			updated_at INTEGER DEFAULT (unixepoch()),
			PRIMARY KEY(key)
		)",
	)
	.execute(&mut *tx)
	.await?;

	let version = get_db_version(&mut tx).await;

	// Schema creation - safe to run every time (uses IF NOT EXISTS)

	// Attempt log: append-only, one row per login/registration attempt
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS attempts (
			attempt_id integer NOT NULL,
			op text NOT NULL,
			addr text NOT NULL,
			email text,
			success integer NOT NULL,
			failure_reason text,
			abuse_score real,
			created_at INTEGER DEFAULT (unixepoch()),
			PRIMARY KEY(attempt_id)
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_attempts_addr_op ON attempts (addr, op, created_at)",
	)
	.execute(&mut *tx)
	.await?;

	// Denylist: one active row per address, upsert semantics
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS denylist (
			addr text NOT NULL,
			reason text NOT NULL,
			blocked_at INTEGER NOT NULL,
			expires_at INTEGER,
			created_at INTEGER DEFAULT (unixepoch()),
			updated_at INTEGER DEFAULT (unixepoch()),
			PRIMARY KEY(addr)
		)",
	)
	.execute(&mut *tx)
	.await?;

	// Block history: append-only audit line behind the denylist upserts,
	// the input for escalation-tier computation
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS denylist_history (
			hist_id integer NOT NULL,
			addr text NOT NULL,
			reason text NOT NULL,
			blocked_at INTEGER NOT NULL,
			expires_at INTEGER,
			PRIMARY KEY(hist_id)
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_denylist_history_addr ON denylist_history (addr, blocked_at)",
	)
	.execute(&mut *tx)
	.await?;

	if version < CURRENT_DB_VERSION {
		set_db_version(&mut tx, CURRENT_DB_VERSION).await;
	}

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
