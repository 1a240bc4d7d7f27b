mod cli;
mod server;
mod tools;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use logstore::config::LogStoreConfig;
use logstore::logs::aggregate::{DEFAULT_HEALTH_WINDOW, DEFAULT_TRENDS_WINDOW};
use logstore::logs::query::{LogFilter, SearchFilter};
use logstore::logs::types::LogRecord;

#[derive(Parser)]
#[command(name = "logstore", version, about = "Embedded development log store with an MCP server")]
struct Cli {
    /// Config file (defaults to ~/.logstore/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio unless --http or transport = "http")
    Serve {
        /// Serve Streamable HTTP at http://host:port/mcp
        #[arg(long)]
        http: bool,
    },
    /// Store a log entry, or a batch from a file
    Ingest(IngestArgs),
    /// List entries matching filters, newest first
    Query(QueryArgs),
    /// Full-text search across entries
    Search {
        query: String,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show every entry of a trace in time order
    Trace { trace_id: String },
    /// List services that have logged
    Services,
    /// Show registered sources
    Sources {
        /// Show only this source
        name: Option<String>,
    },
    /// Per-service health over a window
    Health {
        /// Window in seconds
        #[arg(long, default_value_t = DEFAULT_HEALTH_WINDOW)]
        window: u64,
    },
    /// Hourly error rates per service
    Trends {
        #[arg(long, default_value_t = DEFAULT_TRENDS_WINDOW)]
        window: u64,
    },
    /// Totals by level and service, plus recent errors
    Stats {
        #[arg(long, default_value_t = DEFAULT_TRENDS_WINDOW)]
        window: u64,
    },
    /// Delete entries older than N days
    Cleanup {
        /// Retention in days (defaults to retention.cleanup_days)
        #[arg(long)]
        days: Option<u64>,
    },
    /// Check database integrity and search index sync
    Doctor,
}

#[derive(Args)]
struct IngestArgs {
    /// Read records from a JSON array or JSON-lines file ("-" for stdin)
    #[arg(long, conflicts_with_all = ["level", "service", "message"])]
    file: Option<PathBuf>,

    #[arg(long, required_unless_present = "file")]
    level: Option<String>,
    #[arg(long, required_unless_present = "file")]
    service: Option<String>,
    #[arg(long, required_unless_present = "file")]
    message: Option<String>,

    #[arg(long)]
    component: Option<String>,
    /// JSON payload
    #[arg(long)]
    data: Option<String>,
    /// Seconds since the Unix epoch
    #[arg(long)]
    timestamp: Option<f64>,
    #[arg(long)]
    trace_id: Option<String>,
    #[arg(long)]
    span_id: Option<String>,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    session_id: Option<String>,
    /// Source kind if the service is new (frontend, backend, mcp, system)
    #[arg(long)]
    kind: Option<String>,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    level: Option<String>,
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    component: Option<String>,
    #[arg(long)]
    trace_id: Option<String>,
    /// Only the last N seconds (overrides --since/--until)
    #[arg(long)]
    window: Option<u64>,
    /// Range start, seconds since the Unix epoch
    #[arg(long)]
    since: Option<f64>,
    /// Range end, seconds since the Unix epoch
    #[arg(long)]
    until: Option<f64>,
    #[arg(long)]
    limit: Option<usize>,
}

impl IngestArgs {
    fn into_record(self) -> Result<LogRecord> {
        let data = self
            .data
            .map(|d| serde_json::from_str(&d).context("--data must be valid JSON"))
            .transpose()?;
        Ok(LogRecord {
            level: self.level,
            message: self.message,
            service: self.service,
            component: self.component,
            data,
            timestamp: self.timestamp,
            trace_id: self.trace_id,
            span_id: self.span_id,
            user_id: self.user_id,
            session_id: self.session_id,
            source_kind: self.kind,
        })
    }
}

impl From<QueryArgs> for LogFilter {
    fn from(q: QueryArgs) -> Self {
        LogFilter {
            level: q.level,
            service: q.service,
            component: q.component,
            trace_id: q.trace_id,
            time_window: q.window,
            start_time: q.since,
            end_time: q.until,
            limit: q.limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LogStoreConfig::load_from(path)?,
        None => LogStoreConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    match cli.command {
        Command::Serve { http } => {
            if http || config.server.transport.eq_ignore_ascii_case("http") {
                server::serve_http(config).await?;
            } else {
                server::serve_stdio(config).await?;
            }
        }
        Command::Ingest(args) => match args.file.clone() {
            Some(file) => cli::ingest::ingest_file(&config, &file, json)?,
            None => cli::ingest::ingest_one(&config, args.into_record()?)?,
        },
        Command::Query(args) => cli::search::query(&config, &LogFilter::from(args), json)?,
        Command::Search {
            query,
            service,
            level,
            limit,
        } => {
            let filter = SearchFilter {
                service,
                level,
                limit,
            };
            cli::search::search(&config, &query, &filter, json)?;
        }
        Command::Trace { trace_id } => cli::search::trace(&config, &trace_id, json)?,
        Command::Services => cli::search::services(&config, json)?,
        Command::Sources { name } => cli::search::sources(&config, name.as_deref(), json)?,
        Command::Health { window } => cli::stats::health(&config, window, json)?,
        Command::Trends { window } => cli::stats::trends(&config, window, json)?,
        Command::Stats { window } => cli::stats::stats(&config, window, json)?,
        Command::Cleanup { days } => cli::maintenance::cleanup(&config, days, json)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
