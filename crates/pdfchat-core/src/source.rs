//! Remote collaborators consumed by the workspace.
//!
//! The workspace never talks HTTP itself; it is handed implementations of these traits.
//! `pdfchat-api-client` provides the HTTP versions, tests provide in-memory fakes.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::Document;

/// Remote source of truth for the document collection.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the full document list, in the order the remote defines.
    async fn list_documents(&self) -> Result<Vec<Document>, TransportError>;

    /// Submit raw file content and return the created document.
    async fn upload_document(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Document, TransportError>;
}

/// Parses a document and reports how many pages it has.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn page_count(&self, url: &str) -> Result<u32, TransportError>;
}

/// Produces a reply to a question about a document.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn reply(&self, question: &str, document_name: &str) -> Result<String, TransportError>;
}
