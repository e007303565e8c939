use super::exception::ExceptionProjection;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Key of the synthetic property mirroring `timeStamp`.
pub const TIMESTAMP_PROPERTY: &str = "@timestamp";

/// The normalized document sent to the index.
///
/// Field names follow the index's camelCase schema. `exception` and
/// `serializedException` are always written (`{}` / `null` without an error)
/// so every document has the same shape; location fields are only written
/// when the record carried location info.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDocument {
    pub time_stamp: String,
    pub message: Option<String>,
    pub serialized_message: Option<String>,
    #[serde(serialize_with = "serialize_exception")]
    pub exception: Option<ExceptionProjection>,
    pub serialized_exception: Option<String>,
    pub logger_name: Option<String>,
    pub domain: Option<String>,
    pub identity: Option<String>,
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    pub fix: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub user_name: Option<String>,
    pub thread_name: Option<String>,
    pub host_name: Option<String>,
}

impl LogDocument {
    pub fn timestamp_property(&self) -> Option<&str> {
        self.properties.get(TIMESTAMP_PROPERTY).map(String::as_str)
    }
}

fn serialize_exception<S>(
    exception: &Option<ExceptionProjection>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match exception {
        Some(projection) => projection.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}
