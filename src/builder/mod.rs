//! Raw record -> `LogDocument` conversion.

pub mod exception;
pub mod render;

pub use exception::{MAX_CHAIN_DEPTH, project, project_chain};
pub use render::render_message;

use crate::domain::document::TIMESTAMP_PROPERTY;
use crate::domain::{LogDocument, MessagePayload, RawRecord, RecordedError};
use crate::sanitizer::SanitizingEncoder;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

/// Host name written when the machine name cannot be read.
pub const UNKNOWN_HOST: &str = "unknown";

/// Builds `LogDocument`s from raw records.
///
/// Building never fails: a field whose value cannot be serialized is left
/// empty instead.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    host_name: String,
    encoder: SanitizingEncoder,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            host_name: detect_host_name(),
            encoder: SanitizingEncoder::default(),
        }
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = host_name.into();
        self
    }

    pub fn with_encoder(mut self, encoder: SanitizingEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn encoder(&self) -> &SanitizingEncoder {
        &self.encoder
    }

    pub fn build(&self, record: &RawRecord) -> LogDocument {
        let time_stamp = record
            .timestamp
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Nanos, true);

        let message = record.rendered_message.clone().or_else(|| {
            record
                .payload
                .as_ref()
                .map(|payload| render_message(Some(payload), &self.encoder))
        });

        let (exception, serialized_exception) = match &record.exception {
            Some(error) => {
                let projection = project(error);
                let serialized = self.serialize_field("exception", &projection);
                (Some(projection), serialized)
            }
            None => (None, None),
        };

        let mut document = LogDocument {
            time_stamp: time_stamp.clone(),
            message,
            serialized_message: self.serialize_message(record),
            exception,
            serialized_exception,
            logger_name: record.logger_name.clone(),
            domain: record.domain.clone(),
            identity: record.identity.clone(),
            level: record.level.map(|level| level.display_name().to_string()),
            class_name: None,
            file_name: None,
            line_number: None,
            full_info: None,
            method_name: None,
            fix: record.fix.clone(),
            properties: record.properties.clone(),
            user_name: record.user_name.clone(),
            thread_name: record.thread_name.clone(),
            host_name: Some(self.host_name.clone()),
        };

        if let Some(location) = &record.location {
            document.class_name = location.class_name.clone();
            document.file_name = location.file_name.clone();
            document.line_number = location.line_number.clone();
            document.full_info = location.full_info();
            document.method_name = location.method_name.clone();
        }

        if let Some(previous) = document
            .properties
            .insert(TIMESTAMP_PROPERTY.to_string(), time_stamp)
        {
            debug!(
                "Record property {} ({}) replaced by the event timestamp",
                TIMESTAMP_PROPERTY, previous
            );
        }

        document
    }

    /// Builds one document per record, lazily, in input order.
    pub fn build_many<'a, I>(&'a self, records: I) -> impl Iterator<Item = LogDocument> + 'a
    where
        I: IntoIterator<Item = &'a RawRecord>,
        I::IntoIter: 'a,
    {
        records.into_iter().map(move |record| self.build(record))
    }

    fn serialize_message(&self, record: &RawRecord) -> Option<String> {
        match record.payload.as_ref()? {
            MessagePayload::Text(_) => None,
            MessagePayload::Error(error) => {
                let same_as_exception = record
                    .exception
                    .as_ref()
                    .is_some_and(|exception| exception.is_same(error));
                if same_as_exception {
                    None
                } else {
                    self.serialize_error(error)
                }
            }
            MessagePayload::Structured(message) => match message.to_json() {
                Ok(value) => self
                    .encoder
                    .encode_value(value)
                    .map_err(|e| debug!("Failed to encode message payload: {}", e))
                    .ok(),
                Err(e) => {
                    debug!("Failed to serialize message payload {:?}: {}", message, e);
                    None
                }
            },
        }
    }

    fn serialize_error(&self, error: &RecordedError) -> Option<String> {
        self.serialize_field("message error", &project(error))
    }

    fn serialize_field<T: Serialize>(&self, field: &str, value: &T) -> Option<String> {
        match self.encoder.encode(value) {
            Ok(json) => Some(json),
            Err(e) => {
                debug!("Failed to serialize {}: {}", field, e);
                None
            }
        }
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Level, LocationInfo};
    use chrono::DateTime;

    fn record() -> RawRecord {
        RawRecord::new(DateTime::parse_from_rfc3339("2024-03-01T10:15:30.5+02:00").unwrap())
    }

    #[test]
    fn test_timestamp_converted_to_utc() {
        let document = DocumentBuilder::new().with_host_name("h").build(&record());

        assert_eq!(document.time_stamp, "2024-03-01T08:15:30.500000000Z");
        assert_eq!(document.timestamp_property(), Some(document.time_stamp.as_str()));
        let parsed = DateTime::parse_from_rfc3339(&document.time_stamp).unwrap();
        assert_eq!(parsed, record().timestamp);
    }

    #[test]
    fn test_existing_timestamp_property_overwritten() {
        let record = record().with_property("@timestamp", "yesterday");
        let document = DocumentBuilder::new().with_host_name("h").build(&record);

        assert_eq!(document.properties.len(), 1);
        assert_eq!(document.timestamp_property(), Some("2024-03-01T08:15:30.500000000Z"));
    }

    #[test]
    fn test_location_copied_only_when_present() {
        let builder = DocumentBuilder::new().with_host_name("h");
        let without = builder.build(&record());
        assert!(without.class_name.is_none());
        assert!(without.full_info.is_none());

        let with = builder.build(&record().with_location(LocationInfo {
            class_name: Some("Billing".to_string()),
            file_name: Some("billing.rs".to_string()),
            line_number: Some("12".to_string()),
            method_name: Some("charge".to_string()),
            full_info: None,
        }));
        assert_eq!(with.class_name.as_deref(), Some("Billing"));
        assert_eq!(with.line_number.as_deref(), Some("12"));
        assert_eq!(with.full_info.as_deref(), Some("Billing.charge(billing.rs:12)"));
    }

    #[test]
    fn test_provenance_fields() {
        let record = record()
            .with_message("hi")
            .with_logger_name("app.orders")
            .with_thread_name("worker-1")
            .with_user_name("svc")
            .with_domain("orders.exe")
            .with_identity("alice")
            .with_fix("Partial")
            .with_level(Level::Warn);
        let document = DocumentBuilder::new().with_host_name("node-7").build(&record);

        assert_eq!(document.logger_name.as_deref(), Some("app.orders"));
        assert_eq!(document.thread_name.as_deref(), Some("worker-1"));
        assert_eq!(document.user_name.as_deref(), Some("svc"));
        assert_eq!(document.domain.as_deref(), Some("orders.exe"));
        assert_eq!(document.identity.as_deref(), Some("alice"));
        assert_eq!(document.fix.as_deref(), Some("Partial"));
        assert_eq!(document.level.as_deref(), Some("WARN"));
        assert_eq!(document.host_name.as_deref(), Some("node-7"));
    }

    #[test]
    fn test_detected_host_name_is_not_empty() {
        assert!(!DocumentBuilder::new().host_name().is_empty());
    }
}
