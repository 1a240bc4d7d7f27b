use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use logstore::config::LogStoreConfig;
use logstore::logs::ingest::{ingest, ingest_batch};
use logstore::logs::types::LogRecord;

/// Store a single record given on the command line.
pub fn ingest_one(config: &LogStoreConfig, record: LogRecord) -> Result<()> {
    let mut conn = logstore::db::open_database(config.resolved_db_path())?;
    let id = ingest(&mut conn, &record, &config.retention)?;
    println!("{id}");
    Ok(())
}

/// Import records from a file (`-` for stdin).
///
/// Accepts either a JSON array of records or one JSON record per line.
/// Invalid records are reported and skipped; the rest are stored.
pub fn ingest_file(config: &LogStoreConfig, file: &Path, json: bool) -> Result<()> {
    let contents = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?
    };

    let records = parse_records(&contents)?;
    let mut conn = logstore::db::open_database(config.resolved_db_path())?;
    let result = ingest_batch(&mut conn, &records, &config.retention)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for outcome in result.outcomes.iter().filter(|o| !o.ok) {
        println!(
            "  record {}: {}",
            outcome.index,
            outcome.error.as_deref().unwrap_or("rejected")
        );
    }
    println!(
        "Ingested {} of {} record(s), {} rejected.",
        result.accepted,
        records.len(),
        result.rejected
    );
    Ok(())
}

fn parse_records(contents: &str) -> Result<Vec<LogRecord>> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("failed to parse JSON array of records");
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid JSON on line {}", n + 1))
        })
        .collect()
}
