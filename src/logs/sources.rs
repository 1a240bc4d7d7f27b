//! Log source registry.
//!
//! Sources are created lazily the first time an entry names an unknown
//! service. The `UNIQUE(name)` constraint is the de-duplication key, so racing
//! writers on separate connections converge on a single row.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{LogStoreError, Result};
use crate::logs::types::{now_secs, LogSource, SourceKind};

const SOURCE_COLUMNS: &str =
    "id, name, kind, host, process_id, metadata, created_at, updated_at";

/// Return the id of the source called `name`, creating it if needed.
///
/// An existing source only has its `updated_at` bumped; `kind` and the
/// registration metadata of the first writer win.
pub fn ensure_source(conn: &Connection, name: &str, kind: SourceKind) -> Result<String> {
    if name.trim().is_empty() {
        return Err(LogStoreError::validation("source name must not be empty"));
    }

    let now = now_secs();
    let candidate_id = uuid::Uuid::now_v7().to_string();
    let host = local_host();
    let pid = std::process::id();
    let metadata = serde_json::json!({
        "registered_by": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    });

    conn.execute(
        "INSERT INTO log_sources (id, name, kind, host, process_id, metadata, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) \
         ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at",
        params![
            candidate_id,
            name,
            kind.as_str(),
            host,
            pid,
            metadata.to_string(),
            now,
        ],
    )?;

    let id: String = conn.query_row(
        "SELECT id FROM log_sources WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;

    if id == candidate_id {
        tracing::debug!(source = %name, kind = %kind, id = %id, "registered new log source");
    }
    Ok(id)
}

/// Look up a source by name without creating it.
pub fn get_source(conn: &Connection, name: &str) -> Result<LogSource> {
    conn.query_row(
        &format!("SELECT {SOURCE_COLUMNS} FROM log_sources WHERE name = ?1"),
        params![name],
        source_from_row,
    )
    .optional()?
    .ok_or_else(|| LogStoreError::NotFound(format!("log source {name:?}")))
}

/// All registered sources, ordered by name.
pub fn list_sources(conn: &Connection) -> Result<Vec<LogSource>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SOURCE_COLUMNS} FROM log_sources ORDER BY name"
    ))?;
    let sources = stmt
        .query_map([], source_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sources)
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<LogSource> {
    let kind: String = row.get(2)?;
    let metadata: Option<String> = row.get(5)?;
    Ok(LogSource {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: kind.parse().unwrap_or_default(),
        host: row.get(3)?,
        process_id: row.get(4)?,
        metadata: metadata.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Best-effort host name from the environment.
fn local_host() -> Option<String> {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
        })
        .filter(|h| !h.is_empty())
}
