use serde::Serialize;
use std::collections::BTreeMap;

use crate::classify::{app_fields, Context};
use crate::config::FormatterConfig;
use crate::error::FormatError;
use crate::record::{level_name, LogEntry};
use crate::standard::{Formatter, Standard};

/// One `app.logs.v1` line, borrowing from the entry being formatted.
#[derive(Debug, Serialize)]
struct AppLogsV1Record<'a> {
    schema: Standard,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'a str>,
    #[serde(rename = "env", skip_serializing_if = "Option::is_none")]
    environment: Option<&'a str>,
    channel: &'a str,
    level: &'static str,
    time: String,
    msg: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    ctx: Context<'a>,
}

/// Formatter for the `app.logs.v1` standard.
///
/// The `channel` field becomes the top-level `channel`; every other field
/// goes into `ctx`, with error values rendered as `{"msg", "trace"}`.
#[derive(Debug, Clone, Default)]
pub struct AppLogsV1Formatter {
    config: FormatterConfig,
}

impl AppLogsV1Formatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }
}

impl Formatter for AppLogsV1Formatter {
    fn standard(&self) -> Standard {
        Standard::AppLogsV1
    }

    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>, FormatError> {
        let fields = app_fields(&entry.fields, self.config.max_stack_trace);

        let record = AppLogsV1Record {
            schema: Standard::AppLogsV1,
            service: self.config.service_label(),
            environment: self.config.environment_label(),
            channel: fields.channel,
            level: level_name(&entry.level),
            time: self.config.time_layout.format(&entry.time)?,
            msg: &entry.message,
            ctx: fields.context,
        };

        let mut output = serde_json::to_vec(&record).map_err(|source| FormatError::Encoding {
            schema: Standard::AppLogsV1,
            source,
        })?;
        output.push(b'\n');
        Ok(output)
    }
}
