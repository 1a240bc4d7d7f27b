pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Open (or create) the log database at the given path with schema initialized
/// and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // Set before anything that takes a lock, so concurrent openers wait
    conn.busy_timeout(Duration::from_millis(5000))?;
    // WAL lets readers proceed while a writer holds the lock
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a fully migrated in-memory database.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub integrity_ok: bool,
    pub integrity_details: String,
    /// `true` when the FTS shadow index matches `log_entries` exactly.
    pub fts_in_sync: bool,
    pub schema_version: u32,
    pub source_count: u64,
    pub entry_count: u64,
    pub oldest_entry: Option<f64>,
    pub newest_entry: Option<f64>,
}

/// Run SQLite and FTS5 integrity checks and collect row counts.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let integrity: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .context("integrity_check failed")?;

    // rank = 1 compares the index against the external content table
    let fts_in_sync = match conn.execute(
        "INSERT INTO log_entries_fts (log_entries_fts, rank) VALUES ('integrity-check', 1)",
        [],
    ) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "FTS index integrity check failed");
            false
        }
    };

    let schema_version = migrations::get_schema_version(conn)?;
    let source_count: i64 = conn.query_row("SELECT COUNT(*) FROM log_sources", [], |r| r.get(0))?;
    let (entry_count, oldest_entry, newest_entry): (i64, Option<f64>, Option<f64>) = conn
        .query_row(
            "SELECT COUNT(*), MIN(timestamp), MAX(timestamp) FROM log_entries",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

    Ok(HealthReport {
        integrity_ok: integrity == "ok",
        integrity_details: integrity,
        fts_in_sync,
        schema_version,
        source_count: source_count as u64,
        entry_count: entry_count as u64,
        oldest_entry,
        newest_entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_database_is_fully_migrated() {
        let conn = open_memory_database().unwrap();
        assert_eq!(
            migrations::get_schema_version(&conn).unwrap(),
            migrations::CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn health_check_on_empty_db() {
        let conn = open_memory_database().unwrap();
        let report = check_database_health(&conn).unwrap();
        assert!(report.integrity_ok);
        assert!(report.fts_in_sync);
        assert_eq!(report.entry_count, 0);
        assert_eq!(report.source_count, 0);
        assert!(report.oldest_entry.is_none());
    }
}
