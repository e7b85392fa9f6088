use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::env::{
    env_or, LOG_ENV_ENV, LOG_MAX_STACK_TRACE_ENV, LOG_SERVICE_ENV, LOG_TIME_LAYOUT_ENV,
};
use crate::error::FormatError;

/// Default maximum number of stack frames kept per error.
pub const DEFAULT_MAX_STACK_TRACE: usize = 10;

static MAX_STACK_TRACE: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_STACK_TRACE);

/// Change the maximum trace depth used by configs created afterwards.
///
/// Meant to be called once during startup. Formatters that already exist
/// keep the depth they were built with.
pub fn set_default_max_stack_trace(depth: usize) {
    MAX_STACK_TRACE.store(depth, Ordering::Relaxed);
}

pub fn default_max_stack_trace() -> usize {
    MAX_STACK_TRACE.load(Ordering::Relaxed)
}

/// How the `time` field is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeLayout {
    /// RFC 3339 with the given sub-second precision, `Z` for UTC.
    Rfc3339(SecondsFormat),
    /// A chrono `strftime` pattern, validated on construction.
    Strftime(String),
}

impl TimeLayout {
    /// Build a `strftime` layout, rejecting patterns chrono cannot render.
    pub fn strftime(pattern: impl Into<String>) -> Result<Self, FormatError> {
        let pattern = pattern.into();
        if pattern.is_empty() || StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::InvalidTimeLayout(pattern));
        }
        Ok(TimeLayout::Strftime(pattern))
    }

    /// Parse a layout name from configuration: `rfc3339`, `rfc3339-millis`,
    /// `rfc3339-micros`, `rfc3339-nanos`, or a `strftime` pattern.
    pub fn parse(value: &str) -> Result<Self, FormatError> {
        match value.to_ascii_lowercase().as_str() {
            "rfc3339" => Ok(TimeLayout::Rfc3339(SecondsFormat::Secs)),
            "rfc3339-millis" => Ok(TimeLayout::Rfc3339(SecondsFormat::Millis)),
            "rfc3339-micros" => Ok(TimeLayout::Rfc3339(SecondsFormat::Micros)),
            "rfc3339-nanos" => Ok(TimeLayout::Rfc3339(SecondsFormat::Nanos)),
            _ => TimeLayout::strftime(value),
        }
    }

    pub fn format(&self, time: &DateTime<FixedOffset>) -> Result<String, FormatError> {
        match self {
            TimeLayout::Rfc3339(precision) => Ok(time.to_rfc3339_opts(*precision, true)),
            TimeLayout::Strftime(pattern) => {
                let mut out = String::new();
                write!(out, "{}", time.format(pattern))
                    .map_err(|_| FormatError::InvalidTimeLayout(pattern.clone()))?;
                Ok(out)
            }
        }
    }
}

impl Default for TimeLayout {
    fn default() -> Self {
        TimeLayout::Rfc3339(SecondsFormat::Secs)
    }
}

/// Settings shared by every formatter.
///
/// **Fields**
/// - `time_layout`: rendering of the `time` field, RFC 3339 to the second by
///   default.
/// - `service`, `environment`: optional `service` / `env` labels; empty
///   strings are treated as absent.
/// - `max_stack_trace`: maximum frames kept per error, taken from
///   [`default_max_stack_trace`] when the config is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    pub time_layout: TimeLayout,
    pub service: Option<String>,
    pub environment: Option<String>,
    pub max_stack_trace: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            time_layout: TimeLayout::default(),
            service: None,
            environment: None,
            max_stack_trace: default_max_stack_trace(),
        }
    }
}

impl FormatterConfig {
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_time_layout(mut self, layout: TimeLayout) -> Self {
        self.time_layout = layout;
        self
    }

    pub fn with_max_stack_trace(mut self, depth: usize) -> Self {
        self.max_stack_trace = depth;
        self
    }

    /// Build a config from `LOG_SERVICE`, `LOG_ENV`, `LOG_TIME_LAYOUT` and
    /// `LOG_MAX_STACK_TRACE`, falling back to defaults for unset variables.
    ///
    /// A set but empty or unparsable layout or depth is an error.
    pub fn from_env() -> Result<Self, FormatError> {
        let mut config = FormatterConfig::default();

        let service = env_or(LOG_SERVICE_ENV, "");
        let environment = env_or(LOG_ENV_ENV, "");
        config.service = Some(service).filter(|s| !s.is_empty());
        config.environment = Some(environment).filter(|s| !s.is_empty());

        if let Ok(layout) = std::env::var(LOG_TIME_LAYOUT_ENV) {
            config.time_layout = TimeLayout::parse(&layout)?;
        }

        if let Ok(depth) = std::env::var(LOG_MAX_STACK_TRACE_ENV) {
            config.max_stack_trace = depth.trim().parse::<usize>().map_err(|_| FormatError::InvalidConfig {
                key: LOG_MAX_STACK_TRACE_ENV,
                value: depth.clone(),
            })?;
        }

        Ok(config)
    }

    pub(crate) fn service_label(&self) -> Option<&str> {
        self.service.as_deref().filter(|s| !s.is_empty())
    }

    pub(crate) fn environment_label(&self) -> Option<&str> {
        self.environment.as_deref().filter(|s| !s.is_empty())
    }
}
