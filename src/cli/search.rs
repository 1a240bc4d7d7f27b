//! CLI read commands: `query`, `search`, `trace`, `services`, `sources`.

use anyhow::Result;
use serde::Serialize;

use logstore::config::LogStoreConfig;
use logstore::logs::query::{self, format_entry, format_timestamp, LogFilter, QueryLimits, SearchFilter};
use logstore::logs::sources;
use logstore::logs::types::LogEntry;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_entries(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No log entries found.");
        return;
    }
    for entry in entries {
        println!("{}", format_entry(entry));
    }
}

/// Filtered listing, newest first.
pub fn query(config: &LogStoreConfig, filter: &LogFilter, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let entries = query::query_logs(&conn, filter, QueryLimits::from(&config.query))?;

    if json {
        return print_json(&entries);
    }
    print_entries(&entries);
    Ok(())
}

/// Full-text search from the terminal.
pub fn search(config: &LogStoreConfig, text: &str, filter: &SearchFilter, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let entries = query::search_logs(&conn, text, filter, QueryLimits::from(&config.query))?;

    if json {
        return print_json(&entries);
    }
    if !entries.is_empty() {
        println!("Found {} match(es) for \"{text}\"\n", entries.len());
    }
    print_entries(&entries);
    Ok(())
}

/// Print a request timeline with per-step offsets.
pub fn trace(config: &LogStoreConfig, trace_id: &str, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let steps = query::trace_request(&conn, trace_id)?;

    if json {
        return print_json(&steps);
    }
    if steps.is_empty() {
        println!("No entries for trace {trace_id}.");
        return Ok(());
    }

    println!("Trace {trace_id} ({} step(s))", steps.len());
    println!("{}", "=".repeat(40));
    for step in &steps {
        println!("  +{:>8.3}s  {}", step.delta, format_entry(&step.entry));
    }
    if let (Some(first), Some(last)) = (steps.first(), steps.last()) {
        println!();
        println!("Total duration:        {:.3}s", last.entry.timestamp - first.entry.timestamp);
    }
    Ok(())
}

pub fn services(config: &LogStoreConfig, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let names = query::list_services(&conn)?;

    if json {
        return print_json(&names);
    }
    if names.is_empty() {
        println!("No services have logged yet.");
    }
    for name in &names {
        println!("{name}");
    }
    Ok(())
}

/// Registered sources with their kind and origin.
pub fn sources(config: &LogStoreConfig, name: Option<&str>, json: bool) -> Result<()> {
    let conn = logstore::db::open_database(config.resolved_db_path())?;
    let list = match name {
        Some(name) => vec![sources::get_source(&conn, name)?],
        None => sources::list_sources(&conn)?,
    };

    if json {
        return print_json(&list);
    }
    if list.is_empty() {
        println!("No sources registered.");
        return Ok(());
    }

    println!("{:<24} {:<10} {:<20} {:>8}  {}", "NAME", "KIND", "HOST", "PID", "LAST SEEN");
    for s in &list {
        println!(
            "{:<24} {:<10} {:<20} {:>8}  {}",
            s.name,
            s.kind,
            s.host.as_deref().unwrap_or("-"),
            s.process_id.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            format_timestamp(s.updated_at),
        );
    }
    Ok(())
}
