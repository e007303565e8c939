use crate::domain::LogDocument;
use crate::sanitizer::{EncodeError, SanitizingEncoder};

/// Action line preceding every document: index with no explicit id or
/// routing, so the index named by the destination path is used.
pub const INDEX_ACTION: &str = r#"{"index":{}}"#;

/// Newline-delimited bulk request body: one action line and one document line
/// per document, in push order.
#[derive(Debug, Clone, Default)]
pub struct BulkRequestBody {
    body: String,
    documents: usize,
}

impl BulkRequestBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(
        encoder: &SanitizingEncoder,
        documents: &[LogDocument],
    ) -> Result<Self, EncodeError> {
        let mut body = Self::new();
        for document in documents {
            body.push(encoder, document)?;
        }
        Ok(body)
    }

    pub fn push(
        &mut self,
        encoder: &SanitizingEncoder,
        document: &LogDocument,
    ) -> Result<(), EncodeError> {
        let line = encoder.encode(document)?;
        self.body.push_str(INDEX_ACTION);
        self.body.push('\n');
        self.body.push_str(&line);
        self.body.push('\n');
        self.documents += 1;
        Ok(())
    }

    /// Number of documents in the body.
    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    pub fn into_string(self) -> String {
        self.body
    }
}
