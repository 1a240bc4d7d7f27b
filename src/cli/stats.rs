use anyhow::Result;

use logstore::config::LogStoreConfig;
use logstore::logs::aggregate;
use logstore::logs::query::format_timestamp;

/// Display per-service health in the terminal.
pub fn health(config: &LogStoreConfig, time_window: u64, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let report = aggregate::service_health(&conn, time_window, &config.health)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.is_empty() {
        println!("No services logged in the last {time_window}s.");
        return Ok(());
    }

    println!("Service Health (last {time_window}s)");
    println!("{}", "=".repeat(40));
    println!(
        "  {:<20} {:<9} {:<9} {:>6} {:>6} {:>7} {:>8}  {}",
        "SERVICE", "KIND", "STATUS", "ERR", "WARN", "TOTAL", "ERR %", "LAST SEEN"
    );
    for h in &report {
        println!(
            "  {:<20} {:<9} {:<9} {:>6} {:>6} {:>7} {:>7.1}%  {:.0}s ago",
            h.service,
            h.source_kind,
            h.status,
            h.error_count,
            h.warning_count,
            h.total_logs,
            h.error_rate * 100.0,
            h.seconds_since_last,
        );
    }
    Ok(())
}

/// Display hourly error rates.
pub fn trends(config: &LogStoreConfig, time_window: u64, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let trends = aggregate::error_trends(&conn, time_window)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trends)?);
        return Ok(());
    }
    if trends.is_empty() {
        println!("No log entries in the last {time_window}s.");
        return Ok(());
    }

    println!("Error Trends (last {time_window}s)");
    println!("{}", "=".repeat(40));
    for t in &trends {
        println!(
            "  {}  {:<20} {:>5}/{:<6} {:>6.2}%",
            format_timestamp(t.hour as f64),
            t.service,
            t.error_count,
            t.total_count,
            t.error_rate_percent,
        );
    }
    Ok(())
}

/// Display log statistics in the terminal.
pub fn stats(config: &LogStoreConfig, time_window: u64, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let stats = aggregate::stats(&conn, time_window, config.query.recent_errors)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Log Statistics (last {time_window}s)");
    println!("{}", "=".repeat(40));
    println!("  Total entries:       {}", stats.total_logs);
    println!();

    println!("By Level:");
    for (level, count) in &stats.by_level {
        println!("  {:<12} {}", level, count);
    }
    println!();

    println!("By Service:");
    for (service, count) in &stats.by_service {
        println!("  {:<20} {}", service, count);
    }

    if !stats.recent_errors.is_empty() {
        println!();
        println!("Recent Errors:");
        for e in &stats.recent_errors {
            println!(
                "  {} [{}] {} - {}",
                format_timestamp(e.timestamp),
                e.level,
                e.service,
                e.message
            );
            if let Some(ref data) = e.data {
                println!("      {data}");
            }
        }
    }

    Ok(())
}
