//! Environment variable names read by [`FormatterConfig::from_env`].
//!
//! These are purely helpers; formatters themselves never touch the
//! environment.
//!
//! [`FormatterConfig::from_env`]: crate::config::FormatterConfig::from_env

/// Value of the `service` label.
pub const LOG_SERVICE_ENV: &str = "LOG_SERVICE";

/// Value of the `env` label.
pub const LOG_ENV_ENV: &str = "LOG_ENV";

/// Time layout: `rfc3339`, `rfc3339-millis`, `rfc3339-micros`,
/// `rfc3339-nanos` or a strftime pattern.
pub const LOG_TIME_LAYOUT_ENV: &str = "LOG_TIME_LAYOUT";

/// Maximum number of stack frames recorded per error.
pub const LOG_MAX_STACK_TRACE_ENV: &str = "LOG_MAX_STACK_TRACE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
