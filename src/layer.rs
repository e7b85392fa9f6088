use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::record::{FieldValue, LogEntry};
use crate::stack::ErrorValue;
use crate::standard::Formatter;

/// `tracing_subscriber` layer that formats every event it sees with a
/// [`Formatter`] and writes the line to a [`MakeWriter`].
///
/// The event's `message` becomes the entry message and all other fields
/// become entry fields; `dyn Error` fields are kept as errors. Events that
/// fail to format are reported on stderr and dropped. Level filtering is
/// left to the subscriber's filters.
///
/// `tracing` fields cannot carry an [`HttpRequest`](crate::HttpRequest), so
/// this layer is meant for `app.logs.v1`; use [`Logger`](crate::Logger) for
/// request logs.
pub struct StandardLayer<W> {
    formatter: Box<dyn Formatter>,
    make_writer: W,
}

impl<W> StandardLayer<W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    pub fn new(formatter: Box<dyn Formatter>, make_writer: W) -> Self {
        Self { formatter, make_writer }
    }
}

impl<S, W> Layer<S> for StandardLayer<W>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();

        let mut fields = BTreeMap::new();
        let mut message = String::new();
        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let entry = LogEntry {
            level: *meta.level(),
            time: Utc::now().into(),
            message,
            fields,
        };

        let line = match self.formatter.format(&entry) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("dropping {} log event from {}: {}", self.formatter.standard(), meta.target(), e);
                return;
            }
        };

        let mut writer = self.make_writer.make_writer_for(meta);
        if let Err(e) = writer.write_all(&line) {
            eprintln!("error writing {} log event: {}", self.formatter.standard(), e);
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, FieldValue>,
    pub message: &'a mut String,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        } else {
            self.insert(field, FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, FieldValue::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, FieldValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, FieldValue::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, FieldValue::Error(ErrorValue::from_error(value)));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = format!("{:?}", value);
        } else {
            self.insert(field, FieldValue::Str(format!("{:?}", value)));
        }
    }
}
