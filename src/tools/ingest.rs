//! MCP `ingest_log` / `ingest_logs` tool parameter definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use logstore::logs::types::LogRecord;

/// Parameters for the `ingest_log` MCP tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IngestLogParams {
    // level, message and service are required, but checked by ingestion so a
    // missing one becomes a per-record rejection instead of a schema failure.
    /// Severity: DEBUG, INFO, WARN, ERROR or FATAL (case-insensitive).
    #[schemars(description = "Required. Severity: DEBUG, INFO, WARN, ERROR or FATAL (case-insensitive)")]
    pub level: Option<String>,

    #[schemars(description = "Required. Log message text")]
    pub message: Option<String>,

    /// Service label. The service's source is created on first use.
    #[schemars(description = "Required. Name of the emitting service")]
    pub service: Option<String>,

    #[schemars(description = "Optional component within the service (e.g. 'router', 'db')")]
    pub component: Option<String>,

    /// Arbitrary structured payload, stored as JSON text.
    #[schemars(description = "Optional structured JSON payload")]
    pub data: Option<serde_json::Value>,

    #[schemars(description = "Event time in seconds since the Unix epoch. Defaults to now.")]
    pub timestamp: Option<f64>,

    #[schemars(description = "Optional trace id for request correlation")]
    pub trace_id: Option<String>,

    #[schemars(description = "Optional span id")]
    pub span_id: Option<String>,

    #[schemars(description = "Optional user id")]
    pub user_id: Option<String>,

    #[schemars(description = "Optional session id")]
    pub session_id: Option<String>,

    /// Only used when the service's source does not exist yet.
    #[schemars(
        description = "Source kind if the service is new: frontend, backend, mcp or system. Defaults to backend."
    )]
    pub source_kind: Option<String>,
}

impl From<IngestLogParams> for LogRecord {
    fn from(p: IngestLogParams) -> Self {
        LogRecord {
            level: p.level,
            message: p.message,
            service: p.service,
            component: p.component,
            data: p.data,
            timestamp: p.timestamp,
            trace_id: p.trace_id,
            span_id: p.span_id,
            user_id: p.user_id,
            session_id: p.session_id,
            source_kind: p.source_kind,
        }
    }
}

/// Parameters for the `ingest_logs` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IngestLogsParams {
    #[schemars(description = "Log records to store. Invalid records are reported individually.")]
    pub logs: Vec<IngestLogParams>,
}
