use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::app_logs::AppLogsV1Formatter;
use crate::config::FormatterConfig;
use crate::error::FormatError;
use crate::http_request::HttpRequestV1Formatter;
use crate::record::LogEntry;

/// A named, versioned JSON record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standard {
    /// `app.logs.v1`: application runtime events.
    AppLogsV1,
    /// `http.request.v1`: one line per served HTTP request.
    HttpRequestV1,
}

impl Standard {
    pub const ALL: [Standard; 2] = [Standard::AppLogsV1, Standard::HttpRequestV1];

    /// Wire name written into the `schema` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Standard::AppLogsV1 => "app.logs.v1",
            Standard::HttpRequestV1 => "http.request.v1",
        }
    }

    /// Formatter for this standard with the default configuration.
    pub fn formatter(self) -> Box<dyn Formatter> {
        self.formatter_with(FormatterConfig::default())
    }

    pub fn formatter_with(self, config: FormatterConfig) -> Box<dyn Formatter> {
        match self {
            Standard::AppLogsV1 => Box::new(AppLogsV1Formatter::new(config)),
            Standard::HttpRequestV1 => Box::new(HttpRequestV1Formatter::new(config)),
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Standard {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Standard::ALL
            .into_iter()
            .find(|standard| standard.as_str() == s)
            .ok_or_else(|| FormatError::FormatterNotFound(s.to_string()))
    }
}

impl Serialize for Standard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Turns a [`LogEntry`] into one newline-terminated JSON line.
///
/// Implementations are stateless across calls and may be shared between
/// threads.
pub trait Formatter: Send + Sync {
    /// The standard this formatter produces.
    fn standard(&self) -> Standard;

    /// Format a single entry.
    ///
    /// **Returns**
    /// - `Ok(bytes)` holding one JSON object followed by `\n`.
    /// - `Err(..)` if the entry does not fit the standard or could not be
    ///   encoded. No output is produced in that case.
    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>, FormatError>;
}

/// Get the formatter for a standard given by its wire name.
///
/// Unknown names fail with [`FormatError::FormatterNotFound`].
pub fn new_formatter(standard: &str) -> Result<Box<dyn Formatter>, FormatError> {
    Ok(standard.parse::<Standard>()?.formatter())
}
