use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tracing::Level;
use tracing_log_standard::config::{default_max_stack_trace, DEFAULT_MAX_STACK_TRACE};
use tracing_log_standard::{
    new_formatter, ErrorValue, FormatError, FormatterConfig, Frame, HttpRequest, LogEntry, Standard,
    TimeLayout,
};

fn parse(bytes: &[u8]) -> Value {
    assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 1);
    assert_eq!(bytes.last(), Some(&b'\n'));
    serde_json::from_slice(bytes).unwrap()
}

#[test]
fn app_logs_end_to_end() {
    let formatter = new_formatter("app.logs.v1").unwrap();
    let entry = LogEntry::new(Level::DEBUG, "test log")
        .with_field("channel", "TEST")
        .with_field("foo", "bar")
        .with_error(ErrorValue::new("someError"));

    let out = parse(&formatter.format(&entry).unwrap());
    assert_eq!(out["schema"], "app.logs.v1");
    assert_eq!(out["level"], "debug");
    assert_eq!(out["channel"], "TEST");
    assert_eq!(out["ctx"]["foo"], "bar");
    assert_eq!(out["ctx"]["error"]["msg"], "someError");
    assert!(out["ctx"].get("channel").is_none());
}

#[test]
fn http_request_end_to_end() {
    let formatter = new_formatter("http.request.v1").unwrap();
    let request = HttpRequest::new("GET", "/test")
        .with_query("foo=bar")
        .with_remote_addr("1.2.3.4:1234")
        .with_header("x-test", "1");
    let entry = LogEntry::new(Level::INFO, "")
        .with_field("request", request)
        .with_field("user", 123)
        .with_field("status", 404);

    let out = parse(&formatter.format(&entry).unwrap());
    assert_eq!(out["schema"], "http.request.v1");
    assert_eq!(out["ip"], "1.2.3.4");
    assert_eq!(out["method"], "GET");
    assert_eq!(out["path"], "/test");
    assert_eq!(out["user"], "123");
    assert_eq!(out["headers"], json!({"X-Test": "1"}));
    assert_eq!(out["get"], json!({"foo": "bar"}));
    assert_eq!(out["extra"], json!({"status": 404}));
    assert!(out.get("post").is_none());
    assert!(out.get("error").is_none());
}

#[test]
fn formatting_is_idempotent_for_every_standard() {
    let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let frames = (1..=12).map(|line| Frame::new("svc::handle", "src/svc.rs", line)).collect();
    let entry = LogEntry::new(Level::WARN, "slow")
        .at(time)
        .with_field("request", HttpRequest::new("PUT", "/items/1").with_remote_addr("[::1]:443"))
        .with_field("channel", "items")
        .with_field("elapsed_ms", 1520.5)
        .with_error(ErrorValue::new("deadline exceeded").with_frames(frames));

    let http = Standard::HttpRequestV1.formatter();
    let first = http.format(&entry).unwrap();
    assert_eq!(first, http.format(&entry).unwrap());
    let out = parse(&first);
    assert_eq!(out["ip"], "::1");
    assert_eq!(out["error"]["trace"].as_array().unwrap().len(), DEFAULT_MAX_STACK_TRACE);
    assert_eq!(out["extra"]["channel"], "items");

    // a request in ctx has no JSON form
    let app = Standard::AppLogsV1.formatter();
    assert!(matches!(app.format(&entry), Err(FormatError::Encoding { .. })));
    assert!(matches!(app.format(&entry), Err(FormatError::Encoding { .. })));
}

#[test]
fn custom_time_layout_and_labels() {
    let config = FormatterConfig::default()
        .with_service("checkout")
        .with_environment("staging")
        .with_time_layout(TimeLayout::strftime("%Y-%m-%d %H:%M:%S").unwrap());
    let formatter = Standard::AppLogsV1.formatter_with(config);
    let entry = LogEntry::new(Level::INFO, "ok").at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

    let out = parse(&formatter.format(&entry).unwrap());
    assert_eq!(out["time"], "2024-05-01 12:00:00");
    assert_eq!(out["service"], "checkout");
    assert_eq!(out["env"], "staging");
}

#[test]
fn default_depth_seeds_new_configs() {
    assert_eq!(default_max_stack_trace(), DEFAULT_MAX_STACK_TRACE);
    assert_eq!(FormatterConfig::default().max_stack_trace, DEFAULT_MAX_STACK_TRACE);
}
