//! Parameter definitions for the read-side MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use logstore::logs::query::{LogFilter, SearchFilter};

/// Parameters for the `query_logs` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct QueryLogsParams {
    #[schemars(description = "Filter by level: DEBUG, INFO, WARN, ERROR or FATAL")]
    pub level: Option<String>,

    #[schemars(description = "Filter by service name")]
    pub service: Option<String>,

    #[schemars(description = "Filter by component")]
    pub component: Option<String>,

    #[schemars(description = "Filter by trace id")]
    pub trace_id: Option<String>,

    /// Takes precedence over `start_time`/`end_time`.
    #[schemars(
        description = "Only entries from the last N seconds. Overrides start_time/end_time."
    )]
    pub time_window: Option<u64>,

    #[schemars(description = "Range start, seconds since the Unix epoch (inclusive)")]
    pub start_time: Option<f64>,

    #[schemars(description = "Range end, seconds since the Unix epoch (inclusive)")]
    pub end_time: Option<f64>,

    #[schemars(description = "Maximum number of entries. Defaults to 1000.")]
    pub limit: Option<usize>,
}

impl From<QueryLogsParams> for LogFilter {
    fn from(p: QueryLogsParams) -> Self {
        LogFilter {
            level: p.level,
            service: p.service,
            component: p.component,
            trace_id: p.trace_id,
            time_window: p.time_window,
            start_time: p.start_time,
            end_time: p.end_time,
            limit: p.limit,
        }
    }
}

/// Parameters for the `search_logs` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchLogsParams {
    #[schemars(
        description = "Full-text query over message, service, component and data. Words are matched as plain terms."
    )]
    pub query: String,

    #[schemars(description = "Restrict to one service")]
    pub service: Option<String>,

    #[schemars(description = "Restrict to one level")]
    pub level: Option<String>,

    #[schemars(description = "Maximum number of entries. Defaults to 50.")]
    pub limit: Option<usize>,
}

impl SearchLogsParams {
    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            service: self.service.clone(),
            level: self.level.clone(),
            limit: self.limit,
        }
    }
}

/// Parameters for the `trace_request` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TraceRequestParams {
    #[schemars(description = "Trace id to reconstruct")]
    pub trace_id: String,
}

/// Parameters for the `list_services` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListServicesParams {
    /// Include source records (kind, host, pid) instead of bare names.
    #[schemars(description = "If true, return full source records instead of service names")]
    pub detailed: Option<bool>,
}
