//! Splits entry fields into schema fields and free-form context.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::FormatError;
use crate::record::FieldValue;
use crate::request::HttpRequest;
use crate::stack::ErrorInfo;
use crate::{CHANNEL_KEY, ERROR_KEY, REQUEST_KEY, USER_KEY};

/// A context entry: either the caller's value as-is or a rendered error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ContextValue<'a> {
    Field(&'a FieldValue),
    Error(ErrorInfo),
}

pub(crate) type Context<'a> = BTreeMap<&'a str, ContextValue<'a>>;

#[derive(Debug)]
pub(crate) struct AppFields<'a> {
    pub channel: &'a str,
    pub context: Context<'a>,
}

#[derive(Debug)]
pub(crate) struct HttpFields<'a> {
    pub request: &'a HttpRequest,
    pub user: String,
    pub error: Option<ErrorInfo>,
    pub extra: Context<'a>,
}

fn context_value(value: &FieldValue, max_depth: usize) -> ContextValue<'_> {
    match value {
        FieldValue::Error(err) => ContextValue::Error(ErrorInfo::build(err, max_depth)),
        other => ContextValue::Field(other),
    }
}

/// `channel` becomes the record channel (strings only); everything else
/// lands in the context.
pub(crate) fn app_fields(fields: &BTreeMap<String, FieldValue>, max_depth: usize) -> AppFields<'_> {
    let mut channel = "";
    let mut context = Context::new();

    for (key, value) in fields {
        if key == CHANNEL_KEY {
            channel = value.as_str().unwrap_or_default();
            continue;
        }
        context.insert(key.as_str(), context_value(value, max_depth));
    }

    AppFields { channel, context }
}

/// Requires `request`; pulls out `user` and an `error` holding an error
/// value; everything else lands in the extra context.
pub(crate) fn http_fields(
    fields: &BTreeMap<String, FieldValue>,
    max_depth: usize,
) -> Result<HttpFields<'_>, FormatError> {
    let request = match fields.get(REQUEST_KEY) {
        None => return Err(FormatError::MissingRequestField),
        Some(FieldValue::Request(request)) => request,
        Some(other) => return Err(FormatError::InvalidRequestType(other.kind())),
    };

    let mut user = String::new();
    let mut error = None;
    let mut extra = Context::new();

    for (key, value) in fields {
        match (key.as_str(), value) {
            (REQUEST_KEY, _) => {}
            (USER_KEY, value) => user = value.to_string(),
            (ERROR_KEY, FieldValue::Error(err)) => error = Some(ErrorInfo::build(err, max_depth)),
            (key, value) => {
                extra.insert(key, context_value(value, max_depth));
            }
        }
    }

    Ok(HttpFields { request, user, error, extra })
}
