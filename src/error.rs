use crate::standard::Standard;

/// Error type returned by formatters, the formatter factory and [`Logger`].
///
/// Formatting errors never leave partial output behind: when `format`
/// returns `Err`, nothing was produced.
///
/// [`Logger`]: crate::logger::Logger
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("log formatter not found: log standard {0:?}")]
    FormatterNotFound(String),

    #[error("require \"request\" field")]
    MissingRequestField,

    #[error("\"request\" field MUST hold an http request, got {0}")]
    InvalidRequestType(&'static str),

    #[error("json encode {schema} log")]
    Encoding {
        schema: Standard,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid time layout {0:?}")]
    InvalidTimeLayout(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("write formatted log: {0}")]
    Io(#[from] std::io::Error),
}
