//! NDJSON decoding of raw records for the command-line host.
//!
//! One JSON object per line:
//!
//! ```json
//! {"timestamp": "2024-05-01T12:00:00+02:00", "message": "order placed",
//!  "level": "info", "logger": "shop.orders", "payload": {"order.id": 17},
//!  "exception": {"type": "TimeoutError", "message": "db timed out"},
//!  "properties": {"tenant": "acme"}}
//! ```

use crate::domain::{Level, LocationInfo, MessagePayload, RawRecord, RecordedError};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Split};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Line {line}: invalid timestamp '{value}': {source}")]
    Timestamp {
        line: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Line {line}: not valid UTF-8: {source}")]
    Encoding {
        line: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Line {line}: {source}")]
    Level {
        line: usize,
        #[source]
        source: crate::domain::level::ParseLevelError,
    },
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl InputError {
    /// Decoding errors affect one line only; I/O errors end the input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, InputError::Io(_))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputRecord {
    timestamp: String,
    message: Option<String>,
    level: Option<String>,
    logger: Option<String>,
    thread: Option<String>,
    user: Option<String>,
    domain: Option<String>,
    identity: Option<String>,
    payload: Option<Value>,
    exception: Option<InputException>,
    location: Option<InputLocation>,
    fix: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputException {
    #[serde(rename = "type")]
    type_name: String,
    message: String,
    stack_trace: Option<String>,
    inner: Option<Box<InputException>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputLocation {
    class_name: Option<String>,
    file_name: Option<String>,
    line_number: Option<Value>,
    method_name: Option<String>,
    full_info: Option<String>,
}

/// An error reported by another process, carried by type name and message.
#[derive(Debug)]
pub struct ReportedError {
    message: String,
    inner: Option<RecordedError>,
}

impl fmt::Display for ReportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ReportedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.as_ref().map(|inner| inner as &(dyn Error + 'static))
    }
}

impl From<InputException> for RecordedError {
    fn from(exception: InputException) -> Self {
        let inner = exception.inner.map(|inner| RecordedError::from(*inner));
        let recorded = RecordedError::named(
            ReportedError {
                message: exception.message,
                inner,
            },
            exception.type_name,
        );
        match exception.stack_trace {
            Some(stack_trace) => recorded.with_stack_trace(stack_trace),
            None => recorded,
        }
    }
}

impl From<InputLocation> for LocationInfo {
    fn from(location: InputLocation) -> Self {
        let line_number = location.line_number.map(|line| match line {
            Value::String(line) => line,
            other => other.to_string(),
        });
        LocationInfo {
            class_name: location.class_name,
            file_name: location.file_name,
            line_number,
            method_name: location.method_name,
            full_info: location.full_info,
        }
    }
}

/// Decodes one input line. Blank lines yield `Ok(None)`.
pub fn decode_line(line: &str, line_number: usize) -> Result<Option<RawRecord>, InputError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let input: InputRecord = serde_json::from_str(line).map_err(|source| InputError::Json {
        line: line_number,
        source,
    })?;

    let timestamp =
        DateTime::parse_from_rfc3339(&input.timestamp).map_err(|source| InputError::Timestamp {
            line: line_number,
            value: input.timestamp.clone(),
            source,
        })?;

    let level = input
        .level
        .as_deref()
        .map(str::parse::<Level>)
        .transpose()
        .map_err(|source| InputError::Level {
            line: line_number,
            source,
        })?;

    let mut record = RawRecord::new(timestamp);
    record.rendered_message = input.message;
    record.payload = match input.payload {
        None | Some(Value::Null) => record.rendered_message.clone().map(MessagePayload::Text),
        Some(Value::String(text)) => Some(MessagePayload::Text(text)),
        Some(value) => Some(MessagePayload::structured(value)),
    };
    record.exception = input.exception.map(RecordedError::from);
    record.level = level;
    record.logger_name = input.logger;
    record.thread_name = input.thread;
    record.user_name = input.user;
    record.domain = input.domain;
    record.identity = input.identity;
    record.location = input.location.map(LocationInfo::from);
    record.fix = input.fix;
    record.properties = input.properties;

    Ok(Some(record))
}

/// Streams records from an async line source.
///
/// Lines are read as raw bytes, so a line that is not UTF-8 is reported on its
/// own and reading continues with the next one.
pub struct RecordReader<R> {
    lines: Split<R>,
    line_number: usize,
}

impl<R> RecordReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.split(b'\n'),
            line_number: 0,
        }
    }

    /// Next record, skipping blank lines. `Ok(None)` at end of input.
    pub async fn next_record(&mut self) -> Result<Option<RawRecord>, InputError> {
        while let Some(mut bytes) = self.lines.next_segment().await? {
            self.line_number += 1;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            let line = String::from_utf8(bytes).map_err(|source| InputError::Encoding {
                line: self.line_number,
                source,
            })?;
            if let Some(record) = decode_line(&line, self.line_number)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
