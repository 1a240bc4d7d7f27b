//! Parameter definitions for the analytics and maintenance MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `service_health` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ServiceHealthParams {
    #[schemars(description = "Window in seconds. Defaults to 3600 (one hour).")]
    pub time_window: Option<u64>,
}

/// Parameters for the `error_trends` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ErrorTrendsParams {
    #[schemars(description = "Window in seconds. Defaults to 86400 (one day).")]
    pub time_window: Option<u64>,
}

/// Parameters for the `log_stats` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogStatsParams {
    #[schemars(description = "Window in seconds. Defaults to 86400 (one day).")]
    pub time_window: Option<u64>,
}

/// Parameters for the `cleanup_old_logs` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CleanupParams {
    #[schemars(description = "Delete entries older than this many days. Defaults to 7.")]
    pub retention_days: Option<u64>,
}
