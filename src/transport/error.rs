use crate::sanitizer::EncodeError;
use thiserror::Error;

/// Failure to deliver documents.
///
/// Every variant is a failed send; network errors and unexpected status codes
/// are not distinguished beyond what the HTTP stack reports.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to post {payload} to {destination}: HTTP {status}")]
    UnexpectedStatus {
        payload: String,
        destination: String,
        status: u16,
    },
    #[error("Failed to post {payload} to {destination}: {source}")]
    Request {
        payload: String,
        destination: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to encode {payload}: {source}")]
    Encode {
        payload: String,
        #[source]
        source: EncodeError,
    },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    /// What was being sent: the document type for single posts, the whole
    /// request body for bulk posts.
    pub fn payload(&self) -> Option<&str> {
        match self {
            TransportError::UnexpectedStatus { payload, .. }
            | TransportError::Request { payload, .. }
            | TransportError::Encode { payload, .. } => Some(payload),
            TransportError::Client(_) => None,
        }
    }

    pub fn destination(&self) -> Option<&str> {
        match self {
            TransportError::UnexpectedStatus { destination, .. }
            | TransportError::Request { destination, .. } => Some(destination),
            TransportError::Encode { .. } | TransportError::Client(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::UnexpectedStatus { status, .. } => Some(*status),
            TransportError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
