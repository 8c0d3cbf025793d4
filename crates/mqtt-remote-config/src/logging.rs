use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::default_log_filter_string;

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// The `logging` section of the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// `tracing` filter expression, for example `info` or `mqtt_remote=debug`.
    #[serde(default = "default_log_filter_string")]
    pub filter: String,
    /// Output format for log lines.
    #[serde(default)]
    pub format: LogFormat,
    /// Optional file that receives a copy of every log line.
    #[serde(default)]
    pub file: Option<Utf8PathBuf>,
    /// Logs raw transport events at debug level when enabled.
    #[serde(default)]
    pub log_transport: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter_string(),
            format: LogFormat::default(),
            file: None,
            log_transport: false,
        }
    }
}
