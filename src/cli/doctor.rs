//! CLI `doctor` command. Runs database diagnostics and prints a health report.

use anyhow::{Context, Result};

use logstore::config::LogStoreConfig;
use logstore::db;
use logstore::logs::query::format_timestamp;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &LogStoreConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `logstore serve` or `logstore ingest` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("logstore Health Report");
    println!("======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Retention:");
    match config.retention.auto_sweep_hours {
        0 => println!("  Auto sweep:      disabled"),
        h => println!("  Auto sweep:      {h}h"),
    }
    println!("  Cleanup default: {}d", config.retention.cleanup_days);
    println!();
    println!("Row counts:");
    println!("  Sources:         {}", report.source_count);
    println!("  Entries:         {}", report.entry_count);
    if let (Some(oldest), Some(newest)) = (report.oldest_entry, report.newest_entry) {
        println!("  Oldest entry:    {}", format_timestamp(oldest));
        println!("  Newest entry:    {}", format_timestamp(newest));
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }
    if report.fts_in_sync {
        println!("Search index:      IN SYNC");
    } else {
        println!("Search index:      OUT OF SYNC");
    }

    if !report.integrity_ok || !report.fts_in_sync {
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        if !report.fts_in_sync {
            println!("  2. Or rebuild the search index:");
            println!(
                "     sqlite3 {} \"INSERT INTO log_entries_fts(log_entries_fts) VALUES('rebuild')\"",
                db_path.display()
            );
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
