use std::io;

use tracing::{debug, error};
use tracing_log_standard::config::set_default_max_stack_trace;
use tracing_log_standard::{new_logger, ErrorValue, LogEntry, Standard, StandardLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn main() {
    // Must happen before any formatter is built.
    set_default_max_stack_trace(20);

    // Direct use through a logger.
    let logger = new_logger(Standard::AppLogsV1, io::stdout());
    let cause = io::Error::new(io::ErrorKind::Other, "wow");
    let entry = LogEntry::new(tracing::Level::DEBUG, format!("test {} log", Standard::AppLogsV1))
        .with_field("channel", "TEST")
        .with_field("foo", "bar")
        .with_error(ErrorValue::capture(&cause));
    if let Err(e) = logger.log(&entry) {
        eprintln!("{}", e);
    }

    // Through `tracing`.
    let layer = StandardLayer::new(Standard::AppLogsV1.formatter(), io::stdout);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    debug!(channel = "TEST", foo = "bar", "test tracing log");
    error!(channel = "TEST", error = &cause as &(dyn std::error::Error + 'static), "request failed");
}
