//! Delivery of documents to the index over HTTP.

pub mod auth;
pub mod bulk;
pub mod client;
pub mod error;

pub use auth::{basic_auth_header, redacted, strip_credentials};
pub use bulk::{BulkRequestBody, INDEX_ACTION};
pub use client::{CONTENT_TYPE_JSON, ClientConfig, IndexClient, RequestKind};
pub use error::TransportError;

use crate::domain::LogDocument;
use url::Url;

/// Sends documents to a destination.
///
/// Implementations perform one request per call and report every failure to
/// the caller; they neither retry nor buffer.
pub trait DocumentTransport: Send + Sync {
    fn post(
        &self,
        destination: &Url,
        document: &LogDocument,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    fn post_bulk(
        &self,
        destination: &Url,
        documents: &[LogDocument],
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
