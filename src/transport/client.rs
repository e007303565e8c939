use super::auth::{basic_auth_header, redacted, strip_credentials};
use super::bulk::BulkRequestBody;
use super::error::TransportError;
use super::DocumentTransport;
use crate::domain::LogDocument;
use crate::sanitizer::{EncodeError, SanitizingEncoder};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Content type of both single and bulk requests.
pub const CONTENT_TYPE_JSON: &str = "text/json";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request timeout; `None` waits for the server indefinitely.
    pub timeout: Option<Duration>,
    pub connection_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connection_timeout: None,
            user_agent: format!("rask-log-shipper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Which status codes count as delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Single document: only `201 Created`.
    Single,
    /// Bulk: `201 Created` or `200 OK`. Per-item errors in the response body
    /// are not inspected.
    Bulk,
}

impl RequestKind {
    pub fn is_success(self, status: StatusCode) -> bool {
        match self {
            RequestKind::Single => status == StatusCode::CREATED,
            RequestKind::Bulk => status == StatusCode::CREATED || status == StatusCode::OK,
        }
    }
}

/// HTTP client for an Elasticsearch-compatible document index.
///
/// Each call performs exactly one POST; idle connections are not kept, so
/// nothing is shared between calls except the immutable client settings.
#[derive(Debug, Clone)]
pub struct IndexClient {
    client: Client,
    config: ClientConfig,
    encoder: SanitizingEncoder,
}

impl IndexClient {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut builder = ClientBuilder::new()
            .pool_max_idle_per_host(0)
            .user_agent(&config.user_agent);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connection_timeout) = config.connection_timeout {
            builder = builder.connect_timeout(connection_timeout);
        }

        let client = builder.build().map_err(TransportError::Client)?;

        Ok(Self {
            client,
            config,
            encoder: SanitizingEncoder::default(),
        })
    }

    pub fn with_encoder(mut self, encoder: SanitizingEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn encoder(&self) -> &SanitizingEncoder {
        &self.encoder
    }

    /// Sanitized JSON of one document, exactly as `post` sends it.
    pub fn serialize(&self, document: &LogDocument) -> Result<String, EncodeError> {
        self.encoder.encode(document)
    }

    /// Posts one document. Succeeds only on `201 Created`.
    pub async fn post(
        &self,
        destination: &Url,
        document: &LogDocument,
    ) -> Result<(), TransportError> {
        let payload = document_type_name();
        let body = self
            .serialize(document)
            .map_err(|source| TransportError::Encode {
                payload: payload.to_string(),
                source,
            })?;

        self.send(destination, body, RequestKind::Single, || payload.to_string())
            .await
    }

    /// Posts documents through the bulk API. Succeeds on `200 OK` or
    /// `201 Created`; a failure carries the whole request body.
    pub async fn post_bulk(
        &self,
        destination: &Url,
        documents: &[LogDocument],
    ) -> Result<(), TransportError> {
        if documents.is_empty() {
            debug!("No documents to post to {}", redacted(destination));
            return Ok(());
        }

        let body = BulkRequestBody::from_documents(&self.encoder, documents)
            .map_err(|source| TransportError::Encode {
                payload: format!("bulk of {} documents", documents.len()),
                source,
            })?
            .into_string();
        let payload = body.clone();

        self.send(destination, body, RequestKind::Bulk, move || payload)
            .await
    }

    /// Headers sent with every request. `Authorization` is set from the
    /// destination's user-info, replacing any previous value.
    pub fn build_headers(&self, destination: &Url) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        if let Ok(user_agent) = HeaderValue::from_str(&self.config.user_agent) {
            headers.insert(USER_AGENT, user_agent);
        }
        if let Some(authorization) = basic_auth_header(destination) {
            headers.insert(AUTHORIZATION, authorization);
        }
        headers
    }

    async fn send<F>(
        &self,
        destination: &Url,
        body: String,
        kind: RequestKind,
        payload: F,
    ) -> Result<(), TransportError>
    where
        F: FnOnce() -> String,
    {
        let start = Instant::now();
        let target = redacted(destination);
        let bytes = body.len();

        debug!("Posting {} bytes to {} ({:?})", bytes, target, kind);

        let response = self
            .client
            .post(strip_credentials(destination))
            .headers(self.build_headers(destination))
            .body(body)
            .send()
            .await;

        let status = match response {
            Ok(response) => response.status(),
            Err(source) => {
                warn!("Failed to post to {}: {}", target, source);
                return Err(TransportError::Request {
                    payload: payload(),
                    destination: target,
                    source,
                });
            }
        };

        if kind.is_success(status) {
            debug!(
                "Posted {} bytes to {} in {:?} (HTTP {})",
                bytes,
                target,
                start.elapsed(),
                status.as_u16()
            );
            Ok(())
        } else {
            warn!(
                "Failed to post to {}: HTTP {} ({:?})",
                target,
                status.as_u16(),
                kind
            );
            Err(TransportError::UnexpectedStatus {
                payload: payload(),
                destination: target,
                status: status.as_u16(),
            })
        }
    }
}

impl DocumentTransport for IndexClient {
    async fn post(&self, destination: &Url, document: &LogDocument) -> Result<(), TransportError> {
        IndexClient::post(self, destination, document).await
    }

    async fn post_bulk(
        &self,
        destination: &Url,
        documents: &[LogDocument],
    ) -> Result<(), TransportError> {
        IndexClient::post_bulk(self, destination, documents).await
    }
}

fn document_type_name() -> &'static str {
    let full = std::any::type_name::<LogDocument>();
    full.rsplit("::").next().unwrap_or(full)
}
