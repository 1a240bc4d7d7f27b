pub mod ingest;
pub mod query;
pub mod report;

use ingest::{IngestLogParams, IngestLogsParams};
use query::{ListServicesParams, QueryLogsParams, SearchLogsParams, TraceRequestParams};
use report::{CleanupParams, ErrorTrendsParams, LogStatsParams, ServiceHealthParams};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use logstore::config::LogStoreConfig;
use logstore::logs::aggregate::{DEFAULT_HEALTH_WINDOW, DEFAULT_TRENDS_WINDOW};
use logstore::logs::query::{LogFilter, QueryLimits};
use logstore::logs::types::LogRecord;
use logstore::logs::{aggregate, ingest as write, query as read, retention, sources};

/// The logstore MCP tool handler. Holds the shared connection and config and
/// exposes every tool via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct LogTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    config: Arc<LogStoreConfig>,
}

#[tool_router]
impl LogTools {
    pub fn new(db: Arc<Mutex<Connection>>, config: Arc<LogStoreConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            config,
        }
    }

    /// Store one log record.
    #[tool(description = "Store a log entry. Requires level, message and service; the service is registered as a source on first use.")]
    async fn ingest_log(
        &self,
        Parameters(params): Parameters<IngestLogParams>,
    ) -> Result<String, String> {
        tracing::debug!(service = ?params.service, level = ?params.level, "ingest_log called");

        let record = LogRecord::from(params);
        let retention = self.config.retention.clone();
        let id = self
            .with_conn("ingest", move |conn| write::ingest(conn, &record, &retention))
            .await?;

        to_json(&serde_json::json!({ "id": id }))
    }

    /// Store many log records, each validated on its own.
    #[tool(description = "Store several log entries at once. Returns a per-record outcome; invalid records do not block valid ones.")]
    async fn ingest_logs(
        &self,
        Parameters(params): Parameters<IngestLogsParams>,
    ) -> Result<String, String> {
        tracing::info!(count = params.logs.len(), "ingest_logs called");

        let records: Vec<LogRecord> = params.logs.into_iter().map(LogRecord::from).collect();
        let retention = self.config.retention.clone();
        let result = self
            .with_conn("batch ingest", move |conn| {
                write::ingest_batch(conn, &records, &retention)
            })
            .await?;

        tracing::info!(accepted = result.accepted, rejected = result.rejected, "batch stored");
        to_json(&result)
    }

    /// Filtered retrieval, newest first.
    #[tool(description = "Query log entries by level, service, component, trace id and time range. Newest first.")]
    async fn query_logs(
        &self,
        Parameters(params): Parameters<QueryLogsParams>,
    ) -> Result<String, String> {
        tracing::debug!(?params, "query_logs called");

        let filter = LogFilter::from(params);
        let limits = QueryLimits::from(&self.config.query);
        let logs = self
            .with_conn("query", move |conn| read::query_logs(conn, &filter, limits))
            .await?;

        to_json(&serde_json::json!({ "count": logs.len(), "logs": logs }))
    }

    /// Full-text search.
    #[tool(description = "Full-text search across log messages, services, components and data payloads. Best matches first.")]
    async fn search_logs(
        &self,
        Parameters(params): Parameters<SearchLogsParams>,
    ) -> Result<String, String> {
        tracing::debug!(query = %params.query, "search_logs called");

        let filter = params.filter();
        let text = params.query;
        let limits = QueryLimits::from(&self.config.query);
        let logs = self
            .with_conn("search", move |conn| read::search_logs(conn, &text, &filter, limits))
            .await?;

        to_json(&serde_json::json!({ "count": logs.len(), "logs": logs }))
    }

    /// Reconstruct a request timeline.
    #[tool(description = "Reconstruct a request across services: all entries for a trace id in time order, with the seconds elapsed between steps.")]
    async fn trace_request(
        &self,
        Parameters(params): Parameters<TraceRequestParams>,
    ) -> Result<String, String> {
        let trace_id = params.trace_id;
        let steps = self
            .with_conn("trace", {
                let trace_id = trace_id.clone();
                move |conn| read::trace_request(conn, &trace_id)
            })
            .await?;

        let duration = match (steps.first(), steps.last()) {
            (Some(first), Some(last)) => last.entry.timestamp - first.entry.timestamp,
            _ => 0.0,
        };
        to_json(&serde_json::json!({
            "trace_id": trace_id,
            "steps": steps,
            "duration": duration,
        }))
    }

    #[tool(description = "List every service that has logged, alphabetically. Set detailed=true for source kind, host and pid.")]
    async fn list_services(
        &self,
        Parameters(params): Parameters<ListServicesParams>,
    ) -> Result<String, String> {
        if params.detailed.unwrap_or(false) {
            let list = self.with_conn("list sources", |conn| sources::list_sources(conn)).await?;
            to_json(&list)
        } else {
            let list = self.with_conn("list services", |conn| read::list_services(conn)).await?;
            to_json(&list)
        }
    }

    /// Per-service health rollup.
    #[tool(description = "Health per service over a time window: error, warning, info and debug counts, rates, and a status of healthy, degraded, critical or offline.")]
    async fn service_health(
        &self,
        Parameters(params): Parameters<ServiceHealthParams>,
    ) -> Result<String, String> {
        let window = params.time_window.unwrap_or(DEFAULT_HEALTH_WINDOW);
        let thresholds = self.config.health.clone();
        let health = self
            .with_conn("service health", move |conn| {
                aggregate::service_health(conn, window, &thresholds)
            })
            .await?;

        to_json(&serde_json::json!({ "time_window": window, "services": health }))
    }

    #[tool(description = "Hourly error counts and error rate percentage per service over a time window.")]
    async fn error_trends(
        &self,
        Parameters(params): Parameters<ErrorTrendsParams>,
    ) -> Result<String, String> {
        let window = params.time_window.unwrap_or(DEFAULT_TRENDS_WINDOW);
        let trends = self
            .with_conn("error trends", move |conn| aggregate::error_trends(conn, window))
            .await?;

        to_json(&serde_json::json!({ "time_window": window, "trends": trends }))
    }

    #[tool(description = "Log totals by level and service plus the most recent errors.")]
    async fn log_stats(
        &self,
        Parameters(params): Parameters<LogStatsParams>,
    ) -> Result<String, String> {
        let window = params.time_window.unwrap_or(DEFAULT_TRENDS_WINDOW);
        let recent = self.config.query.recent_errors;
        let stats = self
            .with_conn("stats", move |conn| aggregate::stats(conn, window, recent))
            .await?;

        to_json(&stats)
    }

    /// Explicit deep clean.
    #[tool(description = "Delete log entries older than retention_days (default 7). Returns how many were removed.")]
    async fn cleanup_old_logs(
        &self,
        Parameters(params): Parameters<CleanupParams>,
    ) -> Result<String, String> {
        let days = params
            .retention_days
            .unwrap_or(self.config.retention.cleanup_days);
        tracing::info!(retention_days = days, "cleanup_old_logs called");

        let result = self
            .with_conn("cleanup", move |conn| retention::cleanup_old_logs(conn, days))
            .await?;

        to_json(&result)
    }
}

impl LogTools {
    /// Run a synchronous engine call on the blocking pool with the shared connection.
    async fn with_conn<T, F>(&self, op: &'static str, f: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> logstore::error::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().map_err(|e| format!("db lock poisoned: {e}"))?;
            f(&mut conn).map_err(|e| format!("{op} failed: {e}"))
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_handler]
impl ServerHandler for LogTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "logstore collects development logs. Use ingest_log to record entries, \
                 query_logs or search_logs to find them, trace_request to follow a request, \
                 and service_health or error_trends to spot failing services."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
