//! Error values carried in log fields and their `{msg, trace}` rendering.

use std::backtrace::Backtrace;
use std::fmt;

use serde::Serialize;

/// One call-stack frame, most recent call first when held in a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl Frame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Frame { function: function.into(), file: file.into(), line }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            f.write_str(&self.function)
        } else {
            write!(f, "{} {}:{}", self.function, self.file, self.line)
        }
    }
}

/// An error attached to a log entry.
///
/// The message is fixed when the value is created. A stack trace is only
/// present when the producer recorded one, either explicitly through
/// [`ErrorValue::with_frames`] or by [`ErrorValue::capture`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    message: String,
    frames: Option<Vec<Frame>>,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorValue { message: message.into(), frames: None }
    }

    /// Wrap any error, keeping only its `Display` output.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        ErrorValue::new(err.to_string())
    }

    /// Wrap an error and record the call stack of the caller.
    pub fn capture<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let backtrace = Backtrace::force_capture();
        ErrorValue::from_error(err).with_frames(parse_backtrace(&backtrace.to_string()))
    }

    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured stack trace, `None` when the error carries no trace.
    pub fn stack_trace(&self) -> Option<&[Frame]> {
        self.frames.as_deref()
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E: std::error::Error> From<E> for ErrorValue {
    fn from(err: E) -> Self {
        ErrorValue::from_error(&err)
    }
}

/// Render the stack trace of `err` as `"<function> <file>:<line>"` lines.
///
/// Errors without a trace yield an empty `Vec`.
pub fn extract(err: &ErrorValue) -> Vec<String> {
    match err.stack_trace() {
        Some(frames) => frames.iter().map(Frame::to_string).collect(),
        None => Vec::new(),
    }
}

/// Serialized form of an error: `{"msg": .., "trace": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    #[serde(rename = "msg")]
    pub message: String,
    pub trace: Vec<String>,
}

impl ErrorInfo {
    /// Build the info for `err`, keeping at most `max_depth` of the most
    /// recent frames.
    pub fn build(err: &ErrorValue, max_depth: usize) -> Self {
        let mut trace = extract(err);
        trace.truncate(max_depth);
        ErrorInfo { message: err.message().to_string(), trace }
    }
}

/// Parse the rendered form of a [`Backtrace`].
///
/// Each frame is a `N: function` line optionally followed by an
/// `at file:line:col` line. Leading frames that belong to the capture
/// machinery are dropped.
fn parse_backtrace(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in rendered.lines() {
        let line = line.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_empty() {
                    let (file, line) = split_location(location);
                    frame.file = file;
                    frame.line = line;
                }
            }
            continue;
        }

        let Some((index, function)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        frames.push(Frame::new(strip_symbol_hash(function), "", 0));
    }

    let skip = frames
        .iter()
        .take_while(|frame| {
            frame.function.contains("backtrace") || frame.function.contains("ErrorValue::capture")
        })
        .count();
    frames.split_off(skip)
}

// `file:line:col`, where the file part may itself contain ':'.
fn split_location(location: &str) -> (String, u32) {
    let mut parts = location.rsplitn(3, ':').skip(1);
    let line = parts.next().and_then(|l| l.parse::<u32>().ok());
    if let (Some(line), Some(file)) = (line, parts.next()) {
        return (file.to_string(), line);
    }

    // no column
    match location.rsplit_once(':').and_then(|(f, l)| l.parse::<u32>().ok().map(|l| (f, l))) {
        Some((file, line)) => (file.to_string(), line),
        None => (location.to_string(), 0),
    }
}

fn strip_symbol_hash(function: &str) -> &str {
    match function.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) => head,
        _ => function,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: u32) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::new(format!("app::handler_{i}"), "src/handler.rs", 10 + i))
            .collect()
    }

    #[test]
    fn extract_without_trace_is_empty() {
        assert!(extract(&ErrorValue::new("boom")).is_empty());
    }

    #[test]
    fn extract_renders_frames_in_order() {
        let err = ErrorValue::new("boom").with_frames(frames(2));
        assert_eq!(
            extract(&err),
            vec!["app::handler_0 src/handler.rs:10", "app::handler_1 src/handler.rs:11"]
        );
    }

    #[test]
    fn build_truncates_to_most_recent_frames() {
        let err = ErrorValue::new("boom").with_frames(frames(15));
        let info = ErrorInfo::build(&err, 10);
        assert_eq!(info.message, "boom");
        assert_eq!(info.trace.len(), 10);
        assert_eq!(info.trace[0], "app::handler_0 src/handler.rs:10");
        assert_eq!(info.trace[9], "app::handler_9 src/handler.rs:19");
    }

    #[test]
    fn build_keeps_short_traces() {
        let err = ErrorValue::new("boom").with_frames(frames(3));
        assert_eq!(ErrorInfo::build(&err, 10).trace.len(), 3);
        assert_eq!(ErrorInfo::build(&err, 0).trace.len(), 0);
    }

    #[test]
    fn error_info_serializes_as_msg_and_trace() {
        let info = ErrorInfo::build(&ErrorValue::new("e"), 10);
        assert_eq!(serde_json::to_string(&info).unwrap(), r#"{"msg":"e","trace":[]}"#);
    }

    #[test]
    fn from_std_error_uses_display() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = ErrorValue::from(io);
        assert_eq!(err.message(), "disk on fire");
        assert!(err.stack_trace().is_none());
    }

    #[test]
    fn parse_backtrace_text() {
        let rendered = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::create
             at /rustc/abc/library/std/src/backtrace.rs:331:13
   2: tracing_log_standard::stack::ErrorValue::capture
             at ./src/stack.rs:52:25
   3: my_app::load_config::h0123456789abcdef
             at ./src/config.rs:42:9
   4: core::ops::function::FnOnce::call_once
   5: main
             at ./src/main.rs:7:5
";
        let frames = parse_backtrace(rendered);
        let lines: Vec<String> = frames.iter().map(Frame::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "my_app::load_config ./src/config.rs:42",
                "core::ops::function::FnOnce::call_once",
                "main ./src/main.rs:7",
            ]
        );
    }

    #[test]
    fn split_location_without_column() {
        assert_eq!(split_location("src/lib.rs:12"), ("src/lib.rs".to_string(), 12));
        assert_eq!(split_location("C:\\app\\main.rs:3:1"), ("C:\\app\\main.rs".to_string(), 3));
    }

    #[test]
    fn capture_records_frames() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "x");
        let err = ErrorValue::capture(&io);
        assert_eq!(err.message(), "x");
        assert!(err.stack_trace().is_some());
    }
}
