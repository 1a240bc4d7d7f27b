//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::Connection;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each migration runs in a transaction.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.unchecked_transaction()?;
        match next {
            2 => migrate_v1_to_v2(&tx)?,
            3 => migrate_v2_to_v3(&tx)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(&tx, next)?;
        tx.commit()?;

        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: composite index for per-service time scans, and a full
/// rebuild of the FTS index from the content table.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_log_entries_service_ts ON log_entries(service, timestamp);
         INSERT INTO log_entries_fts (log_entries_fts) VALUES ('rebuild');",
    )
}

/// Migration v2 → v3: give `log_entries` an explicit `seq INTEGER PRIMARY KEY`
/// and key the FTS index on it. Databases created with the current DDL already
/// have the column and are left alone.
fn migrate_v2_to_v3(conn: &Connection) -> rusqlite::Result<()> {
    if has_column(conn, "log_entries", "seq")? {
        return Ok(());
    }

    conn.execute_batch(
        "DROP TRIGGER IF EXISTS log_entries_ai;
         DROP TRIGGER IF EXISTS log_entries_ad;
         DROP TRIGGER IF EXISTS log_entries_au;
         DROP TABLE IF EXISTS log_entries_fts;
         DROP INDEX IF EXISTS idx_log_entries_timestamp;
         DROP INDEX IF EXISTS idx_log_entries_level;
         DROP INDEX IF EXISTS idx_log_entries_service;
         DROP INDEX IF EXISTS idx_log_entries_source;
         DROP INDEX IF EXISTS idx_log_entries_trace;
         DROP INDEX IF EXISTS idx_log_entries_service_ts;
         ALTER TABLE log_entries RENAME TO log_entries_v2;",
    )?;

    // Recreates log_entries, its indexes, the FTS table and triggers
    super::schema::init_schema(conn)?;

    // The insert trigger repopulates the FTS index row by row
    let copied = conn.execute(
        "INSERT INTO log_entries (seq, id, timestamp, level, message, source_id, service,          component, data, trace_id, span_id, user_id, session_id, created_at)          SELECT rowid, id, timestamp, level, message, source_id, service,          component, data, trace_id, span_id, user_id, session_id, created_at          FROM log_entries_v2 ORDER BY rowid",
        [],
    )?;
    tracing::info!(entries = copied, "rebuilt log_entries with explicit seq");

    conn.execute_batch(
        "DROP TABLE log_entries_v2;
         CREATE INDEX IF NOT EXISTS idx_log_entries_service_ts ON log_entries(service, timestamp);",
    )
}

fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
