#![allow(dead_code)]

use logstore::config::RetentionConfig;
use logstore::db;
use logstore::logs::ingest::ingest;
use logstore::logs::types::{now_secs, LogRecord};
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Retention settings with the automatic sweep turned off, so tests can seed
/// entries of any age.
pub fn no_sweep() -> RetentionConfig {
    RetentionConfig {
        auto_sweep_hours: 0,
        ..Default::default()
    }
}

/// Ingest a record `age_secs` in the past with the default retention. Returns the entry id.
pub fn log_at(conn: &mut Connection, level: &str, service: &str, message: &str, age_secs: f64) -> String {
    let record = LogRecord::new(level, service, message).at(now_secs() - age_secs);
    ingest(conn, &record, &RetentionConfig::default()).unwrap()
}

/// Ingest a record with an absolute timestamp, bypassing the automatic sweep.
pub fn log_raw(conn: &mut Connection, record: LogRecord) -> String {
    ingest(conn, &record, &no_sweep()).unwrap()
}

pub fn entry_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))
        .unwrap()
}

/// Rows in the FTS index matching `query`.
pub fn fts_matches(conn: &Connection, query: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM log_entries_fts WHERE log_entries_fts MATCH ?1",
        [query],
        |row| row.get(0),
    )
    .unwrap()
}
