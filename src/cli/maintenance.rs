//! CLI `cleanup` command.

use anyhow::Result;

use logstore::config::LogStoreConfig;
use logstore::logs::query::format_timestamp;
use logstore::logs::retention;

/// Delete entries older than `days` (config default when `None`).
pub fn cleanup(config: &LogStoreConfig, days: Option<u64>, json: bool) -> Result<()> {
    let days = days.unwrap_or(config.retention.cleanup_days);
    let mut conn = logstore::db::open_database(config.resolved_db_path())?;

    let result = retention::cleanup_old_logs(&mut conn, days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.removed > 0 {
        println!(
            "Removed {} entr{} older than {} ({} day(s)).",
            result.removed,
            if result.removed == 1 { "y" } else { "ies" },
            format_timestamp(result.cutoff),
            days
        );
    } else {
        println!("No entries older than {days} day(s).");
    }

    Ok(())
}
