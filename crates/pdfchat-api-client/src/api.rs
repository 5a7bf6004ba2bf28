//! Domain methods for the PDF Chat API client.
//!
//! Endpoints: `GET /pdfs`, `POST /upload-pdf` (multipart field `file`) and `POST /ask`.

use async_trait::async_trait;
use pdfchat_core::{ChatResponder, Document, DocumentRenderer, DocumentSource, TransportError};
use serde::{Deserialize, Serialize};

use crate::ApiClient;

/// Upload endpoint response: the document record plus a status marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub pdf_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Split raw PDF text into dictionaries, each without the text of its nested dictionaries.
fn dictionaries(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut open: Vec<String> = Vec::new();
    let mut closed = Vec::new();
    let mut segment_start = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match &bytes[i..i + 2] {
            b"<<" => {
                if let Some(parent) = open.last_mut() {
                    parent.push_str(&text[segment_start..i]);
                }
                open.push(String::new());
                i += 2;
                segment_start = i;
            }
            b">>" => {
                if let Some(mut own) = open.pop() {
                    own.push_str(&text[segment_start..i]);
                    closed.push(own);
                }
                i += 2;
                segment_start = i;
            }
            _ => i += 1,
        }
    }
    closed
}

/// First token after `key` in a dictionary, skipping longer names that share the prefix.
fn entry<'a>(dict: &'a str, key: &str) -> Option<&'a str> {
    let mut rest = dict;
    while let Some(pos) = rest.find(key) {
        let after = &rest[pos + key.len()..];
        if after.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            rest = after;
            continue;
        }
        let value = after.trim_start();
        let end = value
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_whitespace() || "/<>[]()".contains(*c))
            .map_or(value.len(), |(i, _)| i);
        return (end > 0).then(|| &value[..end]);
    }
    None
}

/// Read the page count out of raw PDF bytes.
///
/// Uses the `/Count` of the root page tree node: `/Type /Pages` without a `/Parent`.
/// Counts on outline or intermediate page tree dictionaries are ignored.
pub fn scan_page_count(data: &[u8]) -> Option<u32> {
    let text = String::from_utf8_lossy(data);
    dictionaries(&text)
        .iter()
        .filter(|dict| entry(dict, "/Type") == Some("/Pages") && entry(dict, "/Parent").is_none())
        .find_map(|dict| entry(dict, "/Count")?.parse::<u32>().ok())
}

impl ApiClient {
    /// List all uploaded documents.
    pub async fn list_documents(&self) -> Result<Vec<Document>, TransportError> {
        self.get("/pdfs").await
    }

    /// Upload a PDF as multipart form data.
    pub async fn upload_document(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadResponse, TransportError> {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
        );
        let response: UploadResponse = self.post_multipart("/upload-pdf", form).await?;
        tracing::debug!(
            id = %response.document.id,
            status = response.status.as_deref().unwrap_or("unknown"),
            "Upload accepted"
        );
        Ok(response)
    }

    /// Ask a question about a document.
    pub async fn ask(&self, question: &str, pdf_name: &str) -> Result<AskResponse, TransportError> {
        let body = AskRequest {
            question: question.to_string(),
            pdf_name: pdf_name.to_string(),
        };
        self.post_json("/ask", &body).await
    }
}

#[async_trait]
impl DocumentSource for ApiClient {
    async fn list_documents(&self) -> Result<Vec<Document>, TransportError> {
        ApiClient::list_documents(self).await
    }

    async fn upload_document(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Document, TransportError> {
        ApiClient::upload_document(self, bytes, filename)
            .await
            .map(|response| response.document)
    }
}

#[async_trait]
impl DocumentRenderer for ApiClient {
    async fn page_count(&self, url: &str) -> Result<u32, TransportError> {
        let data = self.download(url).await?;
        scan_page_count(&data)
            .ok_or_else(|| TransportError::Decode(format!("No page count found in {}", url)))
    }
}

#[async_trait]
impl ChatResponder for ApiClient {
    async fn reply(&self, question: &str, document_name: &str) -> Result<String, TransportError> {
        self.ask(question, document_name)
            .await
            .map(|response| response.answer)
    }
}
