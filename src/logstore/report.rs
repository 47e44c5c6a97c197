//! Error report parsing.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an inbound report was rejected before touching the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    /// One of `error`, `context` or `timestamp` is absent, null or empty.
    #[error("Missing required fields")]
    MissingFields,

    /// Body is not a JSON object, a field has the wrong type, or the timestamp is unreadable.
    #[error("Invalid request format")]
    InvalidFormat,
}

/// A validated error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub error: String,
    pub context: String,
    /// Local wall-clock time the report is filed under.
    pub timestamp: NaiveDateTime,
}

impl ErrorReport {
    pub fn new(error: impl Into<String>, context: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            error: error.into(),
            context: context.into(),
            timestamp,
        }
    }

    /// Parse a `{error, context, timestamp}` JSON body.
    ///
    /// Missing fields win over type errors so a partially filled body always
    /// reports `MissingFields`.
    pub fn from_json(body: &[u8]) -> Result<Self, ReportError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| ReportError::InvalidFormat)?;
        let Value::Object(fields) = value else {
            return Err(ReportError::InvalidFormat);
        };

        let error = text_field(&fields, "error");
        let context = text_field(&fields, "context");
        let timestamp = text_field(&fields, "timestamp");

        if [&error, &context, &timestamp]
            .iter()
            .any(|field| matches!(field, Ok(None)))
        {
            return Err(ReportError::MissingFields);
        }

        let error = error?.ok_or(ReportError::MissingFields)?;
        let context = context?.ok_or(ReportError::MissingFields)?;
        let timestamp = timestamp?.ok_or(ReportError::MissingFields)?;
        let timestamp = parse_timestamp(timestamp).ok_or(ReportError::InvalidFormat)?;

        Ok(Self::new(error, context, timestamp))
    }
}

fn text_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<Option<&'a str>, ReportError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ReportError::InvalidFormat),
    }
}

/// Resolve an ISO-8601 timestamp to local wall-clock time.
///
/// Offsets (`Z`, `+02:00`) are converted to the local zone; timestamps
/// without an offset, and bare dates, are taken as local already.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
