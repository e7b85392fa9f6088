use serde::Serialize;
use std::collections::BTreeMap;

use crate::classify::{http_fields, Context};
use crate::config::FormatterConfig;
use crate::error::FormatError;
use crate::record::{level_name, LogEntry};
use crate::request::{canonical_header_key, HttpRequest};
use crate::stack::ErrorInfo;
use crate::standard::{Formatter, Standard};

/// A query or form parameter: one value stays a scalar, repeated values
/// become an array.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

type Params = BTreeMap<String, ParamValue>;

/// One `http.request.v1` line, borrowing from the entry being formatted.
#[derive(Debug, Serialize)]
struct HttpRequestV1Record<'a> {
    schema: Standard,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'a str>,
    #[serde(rename = "env", skip_serializing_if = "Option::is_none")]
    environment: Option<&'a str>,
    level: &'static str,
    time: String,
    ip: &'a str,
    method: &'a str,
    path: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    user: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    get: Params,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    post: Params,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extra: Context<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

/// Formatter for the `http.request.v1` standard.
///
/// Entries must carry an [`HttpRequest`] under the `request` field. `user`
/// and an `error` holding an error value become top-level fields; anything
/// else goes into `extra`.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestV1Formatter {
    config: FormatterConfig,
}

impl HttpRequestV1Formatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }
}

impl Formatter for HttpRequestV1Formatter {
    fn standard(&self) -> Standard {
        Standard::HttpRequestV1
    }

    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>, FormatError> {
        let fields = http_fields(&entry.fields, self.config.max_stack_trace)?;
        let req = fields.request;

        let record = HttpRequestV1Record {
            schema: Standard::HttpRequestV1,
            service: self.config.service_label(),
            environment: self.config.environment_label(),
            level: level_name(&entry.level),
            time: self.config.time_layout.format(&entry.time)?,
            ip: req.client_ip(),
            method: &req.method,
            path: &req.path,
            user: fields.user,
            headers: fold_headers(req),
            get: group_params(req.query_pairs()),
            post: group_params(req.post_form.clone().unwrap_or_default()),
            extra: fields.extra,
            error: fields.error,
        };

        let mut output = serde_json::to_vec(&record).map_err(|source| FormatError::Encoding {
            schema: Standard::HttpRequestV1,
            source,
        })?;
        output.push(b'\n');
        Ok(output)
    }
}

/// Group headers by canonical name, joining repeated values with `", "`.
fn fold_headers(req: &HttpRequest) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &req.headers {
        headers
            .entry(canonical_header_key(name))
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(value);
            })
            .or_insert_with(|| value.clone());
    }
    headers
}

fn group_params(pairs: Vec<(String, String)>) -> Params {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                ParamValue::Single(values.remove(0))
            } else {
                ParamValue::Multiple(values)
            };
            (key, value)
        })
        .collect()
}
