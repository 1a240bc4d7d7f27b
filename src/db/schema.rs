//! SQL DDL for all log store tables.
//!
//! Defines `log_sources`, `log_entries`, the `log_entries_fts` (FTS5) shadow
//! index with its sync triggers, and `schema_meta`. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Schema DDL for the version 1 layout. Later additions live in migrations.
const SCHEMA_SQL: &str = r#"
-- Producers of log entries
CREATE TABLE IF NOT EXISTS log_sources (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL CHECK(kind IN ('frontend','backend','mcp','system')),
    host TEXT,
    process_id INTEGER,
    metadata TEXT,
    created_at REAL NOT NULL,
    updated_at REAL NOT NULL
);

-- Immutable log records. seq aliases the rowid so VACUUM keeps it stable.
CREATE TABLE IF NOT EXISTS log_entries (
    seq INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    timestamp REAL NOT NULL,
    level TEXT NOT NULL CHECK(level IN ('DEBUG','INFO','WARN','ERROR','FATAL')),
    message TEXT NOT NULL,
    source_id TEXT NOT NULL REFERENCES log_sources(id),
    service TEXT NOT NULL,
    component TEXT,
    data TEXT,
    trace_id TEXT,
    span_id TEXT,
    user_id TEXT,
    session_id TEXT,
    created_at REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_log_entries_timestamp ON log_entries(timestamp);
CREATE INDEX IF NOT EXISTS idx_log_entries_level ON log_entries(level);
CREATE INDEX IF NOT EXISTS idx_log_entries_service ON log_entries(service);
CREATE INDEX IF NOT EXISTS idx_log_entries_source ON log_entries(source_id);
CREATE INDEX IF NOT EXISTS idx_log_entries_trace ON log_entries(trace_id);

-- Full-text shadow index (BM25) over the searchable columns
CREATE VIRTUAL TABLE IF NOT EXISTS log_entries_fts USING fts5(
    message,
    service,
    component,
    data,
    content='log_entries',
    content_rowid='seq'
);

-- Keep the shadow index in lockstep with log_entries
CREATE TRIGGER IF NOT EXISTS log_entries_ai AFTER INSERT ON log_entries BEGIN
    INSERT INTO log_entries_fts (rowid, message, service, component, data)
    VALUES (new.seq, new.message, new.service, new.component, new.data);
END;

CREATE TRIGGER IF NOT EXISTS log_entries_ad AFTER DELETE ON log_entries BEGIN
    INSERT INTO log_entries_fts (log_entries_fts, rowid, message, service, component, data)
    VALUES ('delete', old.seq, old.message, old.service, old.component, old.data);
END;

CREATE TRIGGER IF NOT EXISTS log_entries_au AFTER UPDATE ON log_entries BEGIN
    INSERT INTO log_entries_fts (log_entries_fts, rowid, message, service, component, data)
    VALUES ('delete', old.seq, old.message, old.service, old.component, old.data);
    INSERT INTO log_entries_fts (rowid, message, service, component, data)
    VALUES (new.seq, new.message, new.service, new.component, new.data);
END;

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables = names(&conn, "table");
        assert!(tables.contains(&"log_sources".to_string()));
        assert!(tables.contains(&"log_entries".to_string()));
        assert!(tables.contains(&"log_entries_fts".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));

        let triggers = names(&conn, "trigger");
        assert_eq!(
            triggers,
            vec!["log_entries_ad", "log_entries_ai", "log_entries_au"]
        );
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn level_check_constraint_rejects_lowercase() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO log_sources (id, name, kind, created_at, updated_at) VALUES ('s1', 'api', 'backend', 0, 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO log_entries (id, timestamp, level, message, source_id, service, created_at) \
             VALUES ('e1', 0, 'error', 'boom', 's1', 'api', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn entry_seq_is_the_fts_rowid() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO log_sources (id, name, kind, created_at, updated_at) VALUES ('s1', 'api', 'backend', 0, 0);
             INSERT INTO log_entries (seq, id, timestamp, level, message, source_id, service, created_at)
             VALUES (42, 'e1', 0, 'INFO', 'checkout ok', 's1', 'api', 0);",
        )
        .unwrap();

        let rowid: i64 = conn
            .query_row(
                "SELECT rowid FROM log_entries_fts WHERE log_entries_fts MATCH 'checkout'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rowid, 42);
    }
}
