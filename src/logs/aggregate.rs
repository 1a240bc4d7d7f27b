//! Read-only analytics over stored entries.
//!
//! Everything is recomputed from `log_entries` on each call; there is no
//! pre-aggregated table. Every query has a total ORDER BY and keyed maps are
//! `BTreeMap`s, so the same entry set always yields the same output.

use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::HealthConfig;
use crate::error::Result;
use crate::logs::store::{entry_from_row, ENTRY_COLUMNS};
use crate::logs::types::{now_secs, LogLevel, SourceKind};

/// Default window for [`service_health`], in seconds.
pub const DEFAULT_HEALTH_WINDOW: u64 = 3600;
/// Default window for [`error_trends`] and [`stats`], in seconds.
pub const DEFAULT_TRENDS_WINDOW: u64 = 86_400;

/// Derived health of one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
    Offline,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per (service, source kind) rollup over a time window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    pub service: String,
    pub source_kind: SourceKind,
    /// ERROR and FATAL entries.
    pub error_count: u64,
    pub warning_count: u64,
    pub info_count: u64,
    pub debug_count: u64,
    pub total_logs: u64,
    pub first_seen: f64,
    pub last_seen: f64,
    /// Measured against the clock at call time, so it drifts between calls.
    pub seconds_since_last: f64,
    pub error_rate: f64,
    pub warning_rate: f64,
    pub status: HealthStatus,
}

/// Error rate of one service within one hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorTrend {
    /// Bucket start, epoch seconds aligned to the hour.
    pub hour: i64,
    pub service: String,
    pub error_count: u64,
    pub total_count: u64,
    pub error_rate_percent: f64,
}

/// A recent ERROR/FATAL entry with its payload decoded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentError {
    pub id: String,
    pub timestamp: f64,
    pub level: LogLevel,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Global summary over a time window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogStats {
    pub time_window: u64,
    pub total_logs: u64,
    pub by_level: BTreeMap<String, u64>,
    pub by_service: BTreeMap<String, u64>,
    pub recent_errors: Vec<RecentError>,
}

/// Classify a rollup. Offline wins over any rate-based status.
pub fn derive_status(
    thresholds: &HealthConfig,
    secs_since_last: f64,
    error_rate: f64,
    warning_rate: f64,
) -> HealthStatus {
    if secs_since_last > thresholds.offline_after_secs {
        HealthStatus::Offline
    } else if error_rate > thresholds.critical_error_rate {
        HealthStatus::Critical
    } else if error_rate > thresholds.degraded_error_rate
        || warning_rate > thresholds.degraded_warning_rate
    {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Health of every (service, source kind) pair that logged in the last `time_window` seconds.
///
/// Ordered by error count, then warning count (both descending).
pub fn service_health(
    conn: &Connection,
    time_window: u64,
    thresholds: &HealthConfig,
) -> Result<Vec<ServiceHealth>> {
    let now = now_secs();
    let since = now - time_window as f64;

    let mut stmt = conn.prepare(
        "SELECT e.service, s.kind, \
         SUM(CASE WHEN e.level IN ('ERROR','FATAL') THEN 1 ELSE 0 END) AS errors, \
         SUM(CASE WHEN e.level = 'WARN' THEN 1 ELSE 0 END) AS warnings, \
         SUM(CASE WHEN e.level = 'INFO' THEN 1 ELSE 0 END), \
         SUM(CASE WHEN e.level = 'DEBUG' THEN 1 ELSE 0 END), \
         COUNT(*), MIN(e.timestamp), MAX(e.timestamp) \
         FROM log_entries e JOIN log_sources s ON s.id = e.source_id \
         WHERE e.timestamp >= ?1 \
         GROUP BY e.service, s.kind \
         ORDER BY errors DESC, warnings DESC, e.service ASC, s.kind ASC",
    )?;

    let rows = stmt
        .query_map(params![since], |row| {
            let kind: String = row.get(1)?;
            Ok((
                row.get::<_, String>(0)?,
                kind,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, f64>(8)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let health = rows
        .into_iter()
        .map(|(service, kind, errors, warnings, infos, debugs, total, first, last)| {
            let total_f = total.max(1) as f64;
            let error_rate = errors as f64 / total_f;
            let warning_rate = warnings as f64 / total_f;
            let since_last = (now - last).max(0.0);
            ServiceHealth {
                status: derive_status(thresholds, since_last, error_rate, warning_rate),
                service,
                source_kind: kind.parse().unwrap_or_default(),
                error_count: errors as u64,
                warning_count: warnings as u64,
                info_count: infos as u64,
                debug_count: debugs as u64,
                total_logs: total as u64,
                first_seen: first,
                last_seen: last,
                seconds_since_last: since_last,
                error_rate,
                warning_rate,
            }
        })
        .collect();

    Ok(health)
}

/// Hourly error rate per service. Hours without entries are omitted.
pub fn error_trends(conn: &Connection, time_window: u64) -> Result<Vec<ErrorTrend>> {
    let since = now_secs() - time_window as f64;

    let mut stmt = conn.prepare(
        "SELECT CAST(timestamp / 3600 AS INTEGER) * 3600 AS hour, service, \
         SUM(CASE WHEN level IN ('ERROR','FATAL') THEN 1 ELSE 0 END), COUNT(*) \
         FROM log_entries WHERE timestamp >= ?1 \
         GROUP BY hour, service \
         ORDER BY hour ASC, service ASC",
    )?;

    let trends = stmt
        .query_map(params![since], |row| {
            let errors: i64 = row.get(2)?;
            let total: i64 = row.get(3)?;
            Ok(ErrorTrend {
                hour: row.get(0)?,
                service: row.get(1)?,
                error_count: errors as u64,
                total_count: total as u64,
                error_rate_percent: round2(errors as f64 * 100.0 / total.max(1) as f64),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(trends)
}

/// Totals by level and service, plus the most recent ERROR/FATAL entries.
pub fn stats(conn: &Connection, time_window: u64, recent_errors: usize) -> Result<LogStats> {
    let since = now_secs() - time_window as f64;

    let total_logs: i64 = conn.query_row(
        "SELECT COUNT(*) FROM log_entries WHERE timestamp >= ?1",
        params![since],
        |row| row.get(0),
    )?;

    let mut by_level: BTreeMap<String, u64> = LogLevel::ALL
        .iter()
        .map(|l| (l.as_str().to_string(), 0))
        .collect();
    for (level, count) in grouped_counts(conn, "level", since)? {
        by_level.insert(level, count);
    }
    let by_service: BTreeMap<String, u64> = grouped_counts(conn, "service", since)?.into_iter().collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM log_entries \
         WHERE timestamp >= ?1 AND level IN ('ERROR','FATAL') \
         ORDER BY timestamp DESC, id DESC LIMIT ?2"
    ))?;
    let recent = stmt
        .query_map(params![since, recent_errors as i64], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| RecentError {
            data: entry.data_or_raw(),
            id: entry.id,
            timestamp: entry.timestamp,
            level: entry.level,
            service: entry.service,
            component: entry.component,
            message: entry.message,
        })
        .collect();

    Ok(LogStats {
        time_window,
        total_logs: total_logs as u64,
        by_level,
        by_service,
        recent_errors: recent,
    })
}

/// `SELECT column, COUNT(*) … GROUP BY column` over the window.
fn grouped_counts(conn: &Connection, column: &str, since: f64) -> Result<Vec<(String, u64)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM log_entries WHERE timestamp >= ?1 GROUP BY {column} ORDER BY {column}"
    ))?;
    let rows = stmt
        .query_map(params![since], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetentionConfig;
    use crate::db;
    use crate::logs::ingest::ingest;
    use crate::logs::types::LogRecord;

    fn put(conn: &mut Connection, record: LogRecord) {
        ingest(conn, &record, &RetentionConfig::default()).unwrap();
    }

    #[test]
    fn status_thresholds() {
        let t = HealthConfig::default();
        assert_eq!(derive_status(&t, 301.0, 0.0, 0.0), HealthStatus::Offline);
        assert_eq!(derive_status(&t, 301.0, 1.0, 1.0), HealthStatus::Offline);
        assert_eq!(derive_status(&t, 10.0, 0.11, 0.0), HealthStatus::Critical);
        assert_eq!(derive_status(&t, 10.0, 0.10, 0.0), HealthStatus::Degraded);
        assert_eq!(derive_status(&t, 10.0, 0.05, 0.0), HealthStatus::Healthy);
        assert_eq!(derive_status(&t, 10.0, 0.0, 0.21), HealthStatus::Degraded);
        assert_eq!(derive_status(&t, 10.0, 0.0, 0.20), HealthStatus::Healthy);
        assert_eq!(derive_status(&t, 300.0, 0.0, 0.0), HealthStatus::Healthy);
    }

    #[test]
    fn health_counts_and_orders_services() {
        let mut conn = db::open_memory_database().unwrap();
        let now = now_secs();
        for _ in 0..3 {
            put(&mut conn, LogRecord::new("error", "api", "boom").at(now - 5.0));
        }
        put(&mut conn, LogRecord::new("fatal", "api", "dead").at(now - 4.0));
        put(&mut conn, LogRecord::new("info", "api", "ok").at(now - 3.0));
        put(&mut conn, LogRecord::new("warn", "worker", "slow").at(now - 2.0));
        for _ in 0..9 {
            put(&mut conn, LogRecord::new("info", "worker", "tick").at(now - 1.0));
        }
        put(&mut conn, LogRecord::new("debug", "web", "render").at(now - 1.0));

        let health = service_health(&conn, 3600, &HealthConfig::default()).unwrap();
        let services: Vec<&str> = health.iter().map(|h| h.service.as_str()).collect();
        assert_eq!(services, vec!["api", "worker", "web"]);

        let api = &health[0];
        assert_eq!(api.error_count, 4);
        assert_eq!(api.info_count, 1);
        assert_eq!(api.total_logs, 5);
        assert_eq!(api.status, HealthStatus::Critical);

        let worker = &health[1];
        assert_eq!(worker.warning_count, 1);
        assert_eq!(worker.total_logs, 10);
        assert_eq!(worker.status, HealthStatus::Healthy);

        let web = &health[2];
        assert_eq!(web.debug_count, 1);
        assert_eq!(web.source_kind, SourceKind::Backend);
    }

    #[test]
    fn quiet_service_is_offline() {
        let mut conn = db::open_memory_database().unwrap();
        put(&mut conn, LogRecord::new("error", "cron", "failed").at(now_secs() - 600.0));

        let health = service_health(&conn, 3600, &HealthConfig::default()).unwrap();
        assert_eq!(health.len(), 1);
        assert_eq!(health[0].status, HealthStatus::Offline);
    }

    #[test]
    fn health_respects_window() {
        let mut conn = db::open_memory_database().unwrap();
        put(&mut conn, LogRecord::new("info", "api", "old").at(now_secs() - 7200.0));
        assert!(service_health(&conn, 3600, &HealthConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn trends_bucket_by_hour_and_round() {
        let mut conn = db::open_memory_database().unwrap();
        let hour = ((now_secs() as i64) / 3600 - 2) * 3600;
        let h = hour as f64;

        put(&mut conn, LogRecord::new("error", "api", "e").at(h + 10.0));
        put(&mut conn, LogRecord::new("info", "api", "i").at(h + 20.0));
        put(&mut conn, LogRecord::new("info", "api", "i").at(h + 30.0));
        put(&mut conn, LogRecord::new("fatal", "api", "f").at(h + 3600.0 + 5.0));
        put(&mut conn, LogRecord::new("info", "web", "i").at(h + 40.0));

        let trends = error_trends(&conn, 86_400).unwrap();
        assert_eq!(trends.len(), 3);

        assert_eq!(trends[0].hour, hour);
        assert_eq!(trends[0].service, "api");
        assert_eq!(trends[0].error_count, 1);
        assert_eq!(trends[0].total_count, 3);
        assert_eq!(trends[0].error_rate_percent, 33.33);

        assert_eq!(trends[1].hour, hour);
        assert_eq!(trends[1].service, "web");
        assert_eq!(trends[1].error_rate_percent, 0.0);

        assert_eq!(trends[2].hour, hour + 3600);
        assert_eq!(trends[2].error_rate_percent, 100.0);
    }

    #[test]
    fn stats_totals_and_recent_errors() {
        let mut conn = db::open_memory_database().unwrap();
        let now = now_secs();
        for i in 0..7 {
            put(
                &mut conn,
                LogRecord::new("error", "api", &format!("err{i}"))
                    .at(now - 100.0 + i as f64)
                    .data(serde_json::json!({"attempt": i})),
            );
        }
        put(&mut conn, LogRecord::new("info", "web", "hello").at(now - 50.0));

        let stats = stats(&conn, 3600, 5).unwrap();
        assert_eq!(stats.total_logs, 8);
        assert_eq!(stats.by_level["ERROR"], 7);
        assert_eq!(stats.by_level["INFO"], 1);
        assert_eq!(stats.by_level["FATAL"], 0);
        assert_eq!(stats.by_level.len(), 5);
        assert_eq!(stats.by_service["api"], 7);
        assert_eq!(stats.by_service["web"], 1);

        assert_eq!(stats.recent_errors.len(), 5);
        assert_eq!(stats.recent_errors[0].message, "err6");
        assert_eq!(
            stats.recent_errors[0].data,
            Some(serde_json::json!({"attempt": 6}))
        );
    }

    #[test]
    fn stats_keeps_undecodable_data_raw() {
        let mut conn = db::open_memory_database().unwrap();
        put(&mut conn, LogRecord::new("error", "api", "bad payload"));
        conn.execute("UPDATE log_entries SET data = '{broken'", []).unwrap();

        let stats = stats(&conn, 3600, 5).unwrap();
        assert_eq!(
            stats.recent_errors[0].data,
            Some(serde_json::Value::String("{broken".into()))
        );
    }

    #[test]
    fn health_is_deterministic() {
        let mut conn = db::open_memory_database().unwrap();
        let now = now_secs();
        for (level, service) in [("error", "a"), ("warn", "b"), ("info", "c"), ("error", "b")] {
            put(&mut conn, LogRecord::new(level, service, "x").at(now - 1.0));
        }
        let snapshot = || {
            service_health(&conn, 3600, &HealthConfig::default())
                .unwrap()
                .into_iter()
                .map(|h| (h.service, h.error_count, h.warning_count, h.total_logs, h.last_seen, h.status))
                .collect::<Vec<_>>()
        };
        assert_eq!(snapshot(), snapshot());
    }
}
