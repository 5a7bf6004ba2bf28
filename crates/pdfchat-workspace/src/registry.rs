//! Document registry: the in-memory document list and the current selection.
//!
//! Selection is keyed by document url. The registry guarantees that a selection, when
//! present, names a document it holds, and that no two documents share an id.

use std::collections::HashSet;

use pdfchat_core::{ConsistencyViolation, Document};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRegistry {
    documents: Vec<Document>,
    selected: Option<String>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents in remote order.
    pub fn list(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.selected.as_deref().and_then(|url| self.find_by_url(url))
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.url == url)
    }

    /// Change the selection. Returns whether it actually changed.
    ///
    /// Unknown urls are rejected and leave the selection untouched.
    pub fn select(&mut self, url: Option<&str>) -> Result<bool, ConsistencyViolation> {
        if let Some(url) = url {
            if self.find_by_url(url).is_none() {
                return Err(ConsistencyViolation {
                    url: url.to_string(),
                });
            }
        }
        if self.selected.as_deref() == url {
            return Ok(false);
        }
        self.selected = url.map(str::to_string);
        Ok(true)
    }

    /// Replace the whole list. Returns true if the selection had to be cleared because
    /// its document is gone.
    pub fn replace(&mut self, documents: Vec<Document>) -> bool {
        self.documents = dedupe(documents);
        match self.selected.as_deref() {
            Some(url) if self.find_by_url(url).is_none() => {
                tracing::debug!(url = %url, "Selected document no longer listed");
                self.selected = None;
                true
            }
            _ => false,
        }
    }
}

/// Drop repeated ids, keeping the first occurrence.
fn dedupe(documents: Vec<Document>) -> Vec<Document> {
    let mut ids = HashSet::with_capacity(documents.len());
    let mut urls = HashSet::with_capacity(documents.len());
    let mut kept = Vec::with_capacity(documents.len());

    for doc in documents {
        if !ids.insert(doc.id.clone()) {
            tracing::warn!(id = %doc.id, filename = %doc.filename, "Dropping duplicate document id");
            continue;
        }
        if !urls.insert(doc.url.clone()) {
            tracing::warn!(url = %doc.url, "Two documents share a url, selection resolves to the first");
        }
        kept.push(doc);
    }
    kept
}
