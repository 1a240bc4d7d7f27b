//! Write path: validation, source resolution, insert and retention sweep.
//!
//! [`ingest`] is the single entry point for one record. Validation runs before
//! any write; the rest runs inside one immediate transaction so the entry, its
//! FTS row, the source bump, and the retention sweep commit together.

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::config::RetentionConfig;
use crate::error::{LogStoreError, Result};
use crate::logs::retention::sweep_expired;
use crate::logs::sources::ensure_source;
use crate::logs::store::insert_entry;
use crate::logs::types::{now_secs, parse_level, LogEntry, LogLevel, LogRecord, SourceKind};

/// Per-record outcome of [`ingest_batch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    /// Position of the record in the submitted batch.
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`ingest_batch`].
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub accepted: usize,
    pub rejected: usize,
    pub outcomes: Vec<IngestOutcome>,
}

/// A record that passed validation, normalized for storage.
struct ValidRecord {
    level: LogLevel,
    message: String,
    service: String,
    component: Option<String>,
    data: Option<String>,
    timestamp: f64,
    trace_id: Option<String>,
    span_id: Option<String>,
    user_id: Option<String>,
    session_id: Option<String>,
    source_kind: SourceKind,
}

/// Validate and store one record. Returns the new entry id.
pub fn ingest(
    conn: &mut Connection,
    record: &LogRecord,
    retention: &RetentionConfig,
) -> Result<String> {
    let valid = validate(record)?;
    let now = now_secs();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let source_id = ensure_source(&tx, &valid.service, valid.source_kind)?;

    let entry = LogEntry {
        id: uuid::Uuid::now_v7().to_string(),
        timestamp: valid.timestamp,
        level: valid.level,
        message: valid.message,
        source_id,
        service: valid.service,
        component: valid.component,
        data: valid.data,
        trace_id: valid.trace_id,
        span_id: valid.span_id,
        user_id: valid.user_id,
        session_id: valid.session_id,
        created_at: now,
    };
    insert_entry(&tx, &entry)?;

    if let Some(window) = retention.auto_sweep_secs() {
        sweep_expired(&tx, window)?;
    }

    tx.commit()?;

    tracing::trace!(id = %entry.id, service = %entry.service, level = %entry.level, "log entry stored");
    Ok(entry.id)
}

/// Ingest each record independently.
///
/// A record that fails validation is reported in its outcome and does not
/// affect the others. A storage failure aborts the remaining records.
pub fn ingest_batch(
    conn: &mut Connection,
    records: &[LogRecord],
    retention: &RetentionConfig,
) -> Result<BatchResult> {
    let mut outcomes = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match ingest(conn, record, retention) {
            Ok(id) => outcomes.push(IngestOutcome {
                index,
                ok: true,
                id: Some(id),
                error: None,
            }),
            Err(e) if e.is_validation() => {
                tracing::warn!(index, error = %e, "rejected log record in batch");
                outcomes.push(IngestOutcome {
                    index,
                    ok: false,
                    id: None,
                    error: Some(e.to_string()),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let accepted = outcomes.iter().filter(|o| o.ok).count();
    Ok(BatchResult {
        accepted,
        rejected: outcomes.len() - accepted,
        outcomes,
    })
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(LogStoreError::validation(format!("{field} must not be empty"))),
        None => Err(LogStoreError::validation(format!("{field} is required"))),
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate(record: &LogRecord) -> Result<ValidRecord> {
    let level = parse_level(required(&record.level, "level")?)?;
    required(&record.message, "message")?;
    let service = required(&record.service, "service")?.to_string();

    let timestamp = match record.timestamp {
        Some(ts) if !ts.is_finite() || ts < 0.0 => {
            return Err(LogStoreError::validation(format!(
                "timestamp must be a non-negative number of seconds, got {ts}"
            )));
        }
        Some(ts) => ts,
        None => now_secs(),
    };

    let source_kind = match optional(&record.source_kind) {
        Some(kind) => kind.parse().map_err(LogStoreError::Validation)?,
        None => SourceKind::default(),
    };

    let data = match &record.data {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => Some(serde_json::to_string(value).map_err(LogStoreError::Serialize)?),
    };

    Ok(ValidRecord {
        level,
        // Keep the message verbatim; only emptiness is checked on the trimmed form
        message: record.message.clone().unwrap_or_default(),
        service,
        component: optional(&record.component),
        data,
        timestamp,
        trace_id: optional(&record.trace_id),
        span_id: optional(&record.span_id),
        user_id: optional(&record.user_id),
        session_id: optional(&record.session_id),
        source_kind,
    })
}
