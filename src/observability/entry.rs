//! Structured log records and the sinks that receive them.
//!
//! Wire shape of one record:
//! ```text
//! { severity, message, requestId?, userId?, functionName, timestamp, data?, ...extra }
//! ```

use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::observability::context::LogContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// One structured log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub function_name: String,
    /// ISO-8601, UTC, millisecond precision.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>, ctx: &LogContext) -> Self {
        Self {
            severity,
            message: message.into(),
            request_id: Some(ctx.request_id.clone()),
            user_id: Some(ctx.user_id.clone()),
            function_name: ctx.function_name.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            data: None,
            fields: ctx.extra.clone(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Value of an extra field, for inspection.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"severity\":\"ERROR\",\"message\":\"unserializable log entry: {}\"}}",
                e
            )
        })
    }
}

/// Destination for structured records.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: LogEntry);
}

/// Forwards records into the `tracing` subscriber at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, entry: LogEntry) {
        let line = entry.to_json_line();
        let request_id = entry.request_id.as_deref().unwrap_or("-");
        match entry.severity {
            Severity::Debug => tracing::debug!(
                target: "genai_broker::structured",
                request_id,
                function_name = %entry.function_name,
                entry = %line,
                "{}", entry.message
            ),
            Severity::Info => tracing::info!(
                target: "genai_broker::structured",
                request_id,
                function_name = %entry.function_name,
                entry = %line,
                "{}", entry.message
            ),
            Severity::Warn => tracing::warn!(
                target: "genai_broker::structured",
                request_id,
                function_name = %entry.function_name,
                entry = %line,
                "{}", entry.message
            ),
            Severity::Error => tracing::error!(
                target: "genai_broker::structured",
                request_id,
                function_name = %entry.function_name,
                entry = %line,
                "{}", entry.message
            ),
        }
    }
}

/// Keeps every record in memory; used by tests and the CLI's `--trace` dump.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Records whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }

    /// Records whose `type` field equals `kind` (`PERFORMANCE`, `MEMORY`, ...).
    pub fn of_type(&self, kind: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.field("type").and_then(Value::as_str) == Some(kind))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: LogEntry) {
        self.lock().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::context::RequestContext;
    use serde_json::json;

    #[test]
    fn test_entry_wire_shape() {
        let ctx = LogContext::new("searchYoutube", &RequestContext::for_user("u-9"));
        let entry = LogEntry::new(Severity::Warn, "slow upstream", &ctx)
            .with_data(json!({"query": "calm"}))
            .with_field("type", "PERFORMANCE")
            .with_field("durationMs", 12);

        let value: Value = serde_json::from_str(&entry.to_json_line()).unwrap();
        assert_eq!(value["severity"], "WARN");
        assert_eq!(value["message"], "slow upstream");
        assert_eq!(value["requestId"], ctx.request_id.as_str());
        assert_eq!(value["userId"], "u-9");
        assert_eq!(value["functionName"], "searchYoutube");
        assert_eq!(value["data"]["query"], "calm");
        assert_eq!(value["type"], "PERFORMANCE");
        assert_eq!(value["durationMs"], 12);
        assert!(chrono::DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_memory_sink_filters() {
        let sink = MemorySink::new();
        let ctx = LogContext::new("f", &RequestContext::default());
        sink.emit(LogEntry::new(Severity::Info, "a", &ctx).with_field("type", "MEMORY"));
        sink.emit(LogEntry::new(Severity::Info, "b", &ctx));

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.with_message("b").len(), 1);
        assert_eq!(sink.of_type("MEMORY")[0].message, "a");
        sink.clear();
        assert!(sink.entries().is_empty());
    }
}
