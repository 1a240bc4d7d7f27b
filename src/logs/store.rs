//! Raw storage operations for `log_entries`.
//!
//! The FTS shadow index is maintained by the `log_entries_ai` / `log_entries_ad`
//! triggers, so every statement here keeps table and index in lockstep.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::logs::types::LogEntry;

/// Column list shared by every query that hydrates a [`LogEntry`].
pub(crate) const ENTRY_COLUMNS: &str = "id, timestamp, level, message, source_id, service, component, \
     data, trace_id, span_id, user_id, session_id, created_at";

/// Same as [`ENTRY_COLUMNS`], qualified with the `e` table alias.
pub(crate) const ENTRY_COLUMNS_E: &str = "e.id, e.timestamp, e.level, e.message, e.source_id, e.service, \
     e.component, e.data, e.trace_id, e.span_id, e.user_id, e.session_id, e.created_at";

/// Persist one entry. Returns its `seq` (also the FTS rowid).
pub fn insert_entry(conn: &Connection, entry: &LogEntry) -> Result<i64> {
    conn.execute(
        "INSERT INTO log_entries (id, timestamp, level, message, source_id, service, component, \
         data, trace_id, span_id, user_id, session_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            entry.id,
            entry.timestamp,
            entry.level.as_str(),
            entry.message,
            entry.source_id,
            entry.service,
            entry.component,
            entry.data,
            entry.trace_id,
            entry.span_id,
            entry.user_id,
            entry.session_id,
            entry.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete every entry with `timestamp < cutoff`. Returns the number removed.
pub fn remove_entries_older_than(conn: &Connection, cutoff: f64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM log_entries WHERE timestamp < ?1",
        params![cutoff],
    )?;
    Ok(removed)
}

/// Fetch a single entry by id.
pub fn get_entry(conn: &Connection, id: &str) -> Result<Option<LogEntry>> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM log_entries WHERE id = ?1"),
            params![id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

/// Map a row selected with [`ENTRY_COLUMNS`] (in that order) to a [`LogEntry`].
pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    let level: String = row.get(2)?;
    let level = level.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        level,
        message: row.get(3)?,
        source_id: row.get(4)?,
        service: row.get(5)?,
        component: row.get(6)?,
        data: row.get(7)?,
        trace_id: row.get(8)?,
        span_id: row.get(9)?,
        user_id: row.get(10)?,
        session_id: row.get(11)?,
        created_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::logs::sources::ensure_source;
    use crate::logs::types::{now_secs, LogLevel, SourceKind};

    fn entry(id: &str, source_id: &str, timestamp: f64, message: &str) -> LogEntry {
        LogEntry {
            id: id.into(),
            timestamp,
            level: LogLevel::Info,
            message: message.into(),
            source_id: source_id.into(),
            service: "api".into(),
            component: Some("router".into()),
            data: Some(r#"{"path":"/health"}"#.into()),
            trace_id: None,
            span_id: None,
            user_id: None,
            session_id: None,
            created_at: now_secs(),
        }
    }

    fn fts_count(conn: &Connection, query: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM log_entries_fts WHERE log_entries_fts MATCH ?1",
            [query],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn insert_syncs_fts_index() {
        let conn = db::open_memory_database().unwrap();
        let source = ensure_source(&conn, "api", SourceKind::Backend).unwrap();

        insert_entry(&conn, &entry("e1", &source, now_secs(), "upstream timeout")).unwrap();

        assert_eq!(fts_count(&conn, "timeout"), 1);
        assert_eq!(fts_count(&conn, "router"), 1);
        assert_eq!(fts_count(&conn, "health"), 1);

        let stored = get_entry(&conn, "e1").unwrap().unwrap();
        assert_eq!(stored.message, "upstream timeout");
        assert_eq!(stored.level, LogLevel::Info);
    }

    #[test]
    fn insert_rejects_unknown_source() {
        let conn = db::open_memory_database().unwrap();
        let result = insert_entry(&conn, &entry("e1", "no-such-source", now_secs(), "orphan"));
        assert!(result.is_err());
        assert_eq!(fts_count(&conn, "orphan"), 0);
    }

    #[test]
    fn remove_older_than_retracts_from_fts() {
        let conn = db::open_memory_database().unwrap();
        let source = ensure_source(&conn, "api", SourceKind::Backend).unwrap();
        let now = now_secs();

        insert_entry(&conn, &entry("old", &source, now - 1000.0, "stale message")).unwrap();
        insert_entry(&conn, &entry("new", &source, now, "fresh message")).unwrap();

        let removed = remove_entries_older_than(&conn, now - 10.0).unwrap();
        assert_eq!(removed, 1);

        assert!(get_entry(&conn, "old").unwrap().is_none());
        assert_eq!(fts_count(&conn, "stale"), 0);
        assert_eq!(fts_count(&conn, "fresh"), 1);
    }
}
