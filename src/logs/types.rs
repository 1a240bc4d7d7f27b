//! Core log type definitions.
//!
//! Defines [`LogLevel`] (the five severities), [`SourceKind`] (what kind of
//! producer a source is), [`LogSource`] and [`LogEntry`] (stored records), and
//! [`LogRecord`] (unvalidated ingestion input).

use serde::{Deserialize, Serialize};

use crate::error::{LogStoreError, Result};

/// Log severity. Parsed case-insensitively, always stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            _ => Err(format!(
                "invalid log level: {s:?} (expected one of DEBUG, INFO, WARN, ERROR, FATAL)"
            )),
        }
    }
}

/// Parse a caller-supplied level, mapping failures to a validation error.
pub fn parse_level(raw: &str) -> Result<LogLevel> {
    raw.parse().map_err(LogStoreError::Validation)
}

/// The kind of producer behind a [`LogSource`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Frontend,
    #[default]
    Backend,
    Mcp,
    System,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Mcp => "mcp",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frontend" => Ok(Self::Frontend),
            "backend" => Ok(Self::Backend),
            "mcp" => Ok(Self::Mcp),
            "system" => Ok(Self::System),
            _ => Err(format!("unknown source kind: {s}")),
        }
    }
}

/// A producer of log entries, matching the `log_sources` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSource {
    /// UUID v7 primary key.
    pub id: String,
    /// Unique, human-readable name. Entries reference it by their `service` label.
    pub name: String,
    pub kind: SourceKind,
    pub host: Option<String>,
    pub process_id: Option<u32>,
    /// Opaque JSON object recorded when the source was registered.
    pub metadata: Option<serde_json::Value>,
    /// Seconds since the Unix epoch.
    pub created_at: f64,
    /// Seconds since the Unix epoch; bumped whenever the source logs.
    pub updated_at: f64,
}

/// One immutable log record, matching the `log_entries` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// UUID v7 primary key.
    pub id: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub level: LogLevel,
    pub message: String,
    pub source_id: String,
    /// Caller-supplied service label. May differ from the source's name.
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Raw JSON text of the structured payload, exactly as stored. Serialized
    /// as the decoded JSON value.
    #[serde(with = "json_text", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub created_at: f64,
}

impl LogEntry {
    /// Decode the stored `data` payload.
    pub fn parsed_data(&self) -> Result<Option<serde_json::Value>> {
        self.data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(LogStoreError::Parse)
    }

    /// Decode `data`, falling back to the raw text when it is not valid JSON.
    pub fn data_or_raw(&self) -> Option<serde_json::Value> {
        self.data.as_deref().map(json_text::decode_or_raw)
    }
}

/// Serde adapter for JSON stored as text: written out decoded, read back from
/// any JSON value.
mod json_text {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub(super) fn decode_or_raw(raw: &str) -> Value {
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "keeping undecodable data as raw text");
            Value::String(raw.to_string())
        })
    }

    pub fn serialize<S: Serializer>(data: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        data.as_deref().map(decode_or_raw).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.map(|v| v.to_string()))
    }
}

/// Unvalidated ingestion input.
///
/// Every field is optional at the type level so that a missing `level`,
/// `message`, or `service` surfaces as a validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    pub level: Option<String>,
    pub message: Option<String>,
    pub service: Option<String>,
    pub component: Option<String>,
    pub data: Option<serde_json::Value>,
    /// Seconds since the Unix epoch. Defaults to ingestion time.
    pub timestamp: Option<f64>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// Kind used if the service's source has to be created.
    pub source_kind: Option<String>,
}

impl LogRecord {
    pub fn new(level: &str, service: &str, message: &str) -> Self {
        Self {
            level: Some(level.to_string()),
            service: Some(service.to_string()),
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    pub fn trace(mut self, trace_id: &str) -> Self {
        self.trace_id = Some(trace_id.to_string());
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Current time as fractional seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
