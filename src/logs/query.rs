//! Read paths over `log_entries`: filtered listing, FTS5 search, trace
//! reconstruction and the service list.
//!
//! Filters are assembled into parameterized SQL. Search input is quoted word by
//! word before it reaches `MATCH`, so FTS operators in user text are inert.

use rusqlite::{types::Value, Connection};
use serde::Serialize;

use crate::error::Result;
use crate::logs::store::{entry_from_row, ENTRY_COLUMNS, ENTRY_COLUMNS_E};
use crate::logs::types::{now_secs, parse_level, LogEntry};

// ── Public types ──────────────────────────────────────────────────────────────

/// Filters for [`query_logs`].
///
/// `time_window` (seconds back from now) takes precedence over an explicit
/// `start_time`/`end_time` range when both are set.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub level: Option<String>,
    pub service: Option<String>,
    pub component: Option<String>,
    pub trace_id: Option<String>,
    pub time_window: Option<u64>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub limit: Option<usize>,
}

/// Narrowing for [`search_logs`].
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub service: Option<String>,
    pub level: Option<String>,
    pub limit: Option<usize>,
}

/// Default result caps.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub default_limit: usize,
    pub search_limit: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 1000,
            search_limit: 50,
        }
    }
}

impl From<&crate::config::QueryConfig> for QueryLimits {
    fn from(config: &crate::config::QueryConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            search_limit: config.search_limit,
        }
    }
}

/// One step of a reconstructed request timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TraceStep {
    #[serde(flatten)]
    pub entry: LogEntry,
    /// Seconds since the previous step. Zero for the first.
    pub delta: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Filtered retrieval, newest first.
pub fn query_logs(conn: &Connection, filter: &LogFilter, limits: QueryLimits) -> Result<Vec<LogEntry>> {
    let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM log_entries WHERE 1=1");
    let mut args: Vec<Value> = Vec::new();

    if let Some(level) = &filter.level {
        let level = parse_level(level)?;
        push_clause(&mut sql, &mut args, "level = ?", level.as_str().to_string().into());
    }
    if let Some(service) = &filter.service {
        push_clause(&mut sql, &mut args, "service = ?", service.clone().into());
    }
    if let Some(component) = &filter.component {
        push_clause(&mut sql, &mut args, "component = ?", component.clone().into());
    }
    if let Some(trace_id) = &filter.trace_id {
        push_clause(&mut sql, &mut args, "trace_id = ?", trace_id.clone().into());
    }

    match filter.time_window {
        Some(window) => {
            let since = now_secs() - window as f64;
            push_clause(&mut sql, &mut args, "timestamp >= ?", since.into());
        }
        None => {
            if let Some(start) = filter.start_time {
                push_clause(&mut sql, &mut args, "timestamp >= ?", start.into());
            }
            if let Some(end) = filter.end_time {
                push_clause(&mut sql, &mut args, "timestamp <= ?", end.into());
            }
        }
    }

    let limit = filter.limit.unwrap_or(limits.default_limit);
    sql.push_str(" ORDER BY timestamp DESC, id DESC LIMIT ?");
    args.push((limit as i64).into());

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(rusqlite::params_from_iter(args), entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Full-text search over message, service, component, and data.
///
/// Ordered by BM25 rank, then recency.
pub fn search_logs(
    conn: &Connection,
    query: &str,
    filter: &SearchFilter,
    limits: QueryLimits,
) -> Result<Vec<LogEntry>> {
    let escaped = escape_fts_query(query);
    if escaped.is_empty() {
        return Ok(Vec::new());
    }

    let mut sql = format!(
        "SELECT {ENTRY_COLUMNS_E} FROM log_entries_fts \
         JOIN log_entries e ON e.seq = log_entries_fts.rowid \
         WHERE log_entries_fts MATCH ?"
    );
    let mut args: Vec<Value> = vec![escaped.into()];

    if let Some(level) = &filter.level {
        let level = parse_level(level)?;
        push_clause(&mut sql, &mut args, "e.level = ?", level.as_str().to_string().into());
    }
    if let Some(service) = &filter.service {
        push_clause(&mut sql, &mut args, "e.service = ?", service.clone().into());
    }

    let limit = filter.limit.unwrap_or(limits.search_limit);
    sql.push_str(" ORDER BY log_entries_fts.rank, e.timestamp DESC LIMIT ?");
    args.push((limit as i64).into());

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(rusqlite::params_from_iter(args), entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Every entry sharing `trace_id`, oldest first, with inter-step deltas.
pub fn trace_request(conn: &Connection, trace_id: &str) -> Result<Vec<TraceStep>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM log_entries WHERE trace_id = ?1 ORDER BY timestamp ASC, id ASC"
    ))?;
    let entries = stmt
        .query_map([trace_id], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut previous: Option<f64> = None;
    let steps = entries
        .into_iter()
        .map(|entry| {
            let delta = previous.map_or(0.0, |p| entry.timestamp - p);
            previous = Some(entry.timestamp);
            TraceStep { entry, delta }
        })
        .collect();
    Ok(steps)
}

/// Distinct service labels that have logged, alphabetical.
pub fn list_services(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT service FROM log_entries ORDER BY service")?;
    let services = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(services)
}

/// Render an entry as `timestamp [LEVEL] service component - message`.
pub fn format_entry(entry: &LogEntry) -> String {
    let ts = format_timestamp(entry.timestamp);
    match &entry.component {
        Some(component) => format!(
            "{ts} [{}] {} {component} - {}",
            entry.level, entry.service, entry.message
        ),
        None => format!("{ts} [{}] {} - {}", entry.level, entry.service, entry.message),
    }
}

/// RFC 3339 rendering of epoch seconds, millisecond precision.
pub fn format_timestamp(secs: f64) -> String {
    let millis = (secs * 1000.0).round() as i64;
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_else(|| format!("{secs}"))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn push_clause(sql: &mut String, args: &mut Vec<Value>, clause: &str, value: Value) {
    sql.push_str(" AND ");
    sql.push_str(clause);
    args.push(value);
}

/// Escape a user query for FTS5 MATCH syntax.
///
/// Wraps each whitespace-delimited word in double quotes so FTS5 treats them
/// as plain terms (implicit AND). Words with no alphanumeric character would
/// tokenize to nothing and are dropped.
fn escape_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| word.replace('"', ""))
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(|word| format!("\"{word}\""))
        .collect::<Vec<_>>()
        .join(" ")
}
