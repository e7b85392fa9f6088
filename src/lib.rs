pub mod error;
pub mod record;
pub mod request;
pub mod stack;
pub mod standard;
pub mod config;
pub mod env;

mod classify;
pub mod app_logs;
pub mod http_request;

pub mod logger;

#[cfg(feature = "layer")]
pub mod layer;

pub use app_logs::AppLogsV1Formatter;
pub use config::{FormatterConfig, TimeLayout};
pub use error::FormatError;
pub use http_request::HttpRequestV1Formatter;
#[cfg(feature = "layer")]
pub use layer::StandardLayer;
pub use logger::{new_logger, new_logger_with, Logger};
pub use record::{FieldValue, LogEntry};
pub use request::HttpRequest;
pub use stack::{ErrorInfo, ErrorValue, Frame};
pub use standard::{new_formatter, Formatter, Standard};

/// Field holding the channel of an `app.logs.v1` entry.
pub const CHANNEL_KEY: &str = "channel";

/// Field holding the [`HttpRequest`] of an `http.request.v1` entry.
pub const REQUEST_KEY: &str = "request";

/// Field holding the user identifier of an `http.request.v1` entry.
pub const USER_KEY: &str = "user";

/// Conventional field for an attached error.
pub const ERROR_KEY: &str = "error";
