//! Retention policy.
//!
//! Two independent mechanisms bound storage growth:
//!
//! - [`sweep_expired`] runs inside every ingest transaction, right after the
//!   insert, with the short automatic window (24 hours by default).
//! - [`cleanup_old_logs`] is an on-demand deep clean with a caller-chosen
//!   window in days (7 by default), run from the CLI or the MCP tool.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{LogStoreError, Result};
use crate::logs::store::remove_entries_older_than;
use crate::logs::types::now_secs;

/// Default window for [`cleanup_old_logs`].
pub const DEFAULT_CLEANUP_DAYS: u64 = 7;

/// Result of an explicit cleanup run.
#[derive(Debug, Serialize)]
pub struct CleanupResult {
    pub retention_days: u64,
    /// Entries with a timestamp before this instant were removed.
    pub cutoff: f64,
    pub removed: usize,
}

/// Remove entries older than `window_secs` before now.
///
/// Called by ingestion after each insert. An entry that was itself older than
/// the cutoff is removed here too.
pub fn sweep_expired(conn: &Connection, window_secs: f64) -> Result<usize> {
    let cutoff = now_secs() - window_secs;
    let removed = remove_entries_older_than(conn, cutoff)?;
    if removed > 0 {
        tracing::debug!(removed, cutoff, "retention sweep removed expired entries");
    }
    Ok(removed)
}

/// Explicit cleanup: delete every entry older than `retention_days`.
pub fn cleanup_old_logs(conn: &mut Connection, retention_days: u64) -> Result<CleanupResult> {
    if retention_days == 0 {
        return Err(LogStoreError::validation(
            "retention_days must be at least 1",
        ));
    }

    let cutoff = now_secs() - retention_days as f64 * 86_400.0;
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
    let removed = remove_entries_older_than(&tx, cutoff)?;
    tx.commit()?;

    tracing::info!(retention_days, removed, "cleaned up old log entries");

    Ok(CleanupResult {
        retention_days,
        cutoff,
        removed,
    })
}
