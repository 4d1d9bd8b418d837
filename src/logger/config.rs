use serde::{Deserialize, Serialize};

/// Logger configuration for tracing output.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct LoggerConfig {
    /// Log level filter (e.g. "info", or per-target like "info,drip_blockchain=debug")
    pub level: String,
    /// Output format: "pretty" for human-readable, "json" for structured JSON logs
    pub format: LogFormat,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LogFormat {
    Pretty,
    Json,
}
