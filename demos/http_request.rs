use std::io;

use tracing_log_standard::{new_logger_with, FormatterConfig, HttpRequest, LogEntry, Standard, TimeLayout};

fn main() {
    let config = FormatterConfig::default()
        .with_service("demo")
        .with_time_layout(TimeLayout::parse("rfc3339-nanos").expect("valid layout"));
    let logger = new_logger_with(Standard::HttpRequestV1, config, io::stdout());

    let request = HttpRequest::new("GET", "/test")
        .with_remote_addr("1.2.3.4:1234")
        .with_query("foo=bar")
        .with_header("x-test", "1");

    let entry = LogEntry::new(tracing::Level::INFO, "")
        .with_field("request", request)
        .with_field("status", 404)
        .with_field("user", 123);

    if let Err(e) = logger.log(&entry) {
        eprintln!("{}", e);
    }
}
