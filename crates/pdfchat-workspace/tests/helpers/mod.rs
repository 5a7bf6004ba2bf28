//! In-memory collaborators for workspace integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use pdfchat_core::{
    ChatResponder, Document, DocumentRenderer, DocumentSource, TransportError, UploadFile,
};
use pdfchat_workspace::Workspace;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub const MIB: usize = 1024 * 1024;

pub fn pdf_file(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, "application/pdf", vec![b'%'; size])
}

pub fn png_file(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, "image/png", vec![0x89; size])
}

pub fn document(id: &str, filename: &str) -> Document {
    Document::new(id, filename, format!("https://files.test/{id}_{filename}"))
}

/// A list response held back until the test releases it.
struct ScriptedList {
    gate: Option<oneshot::Receiver<()>>,
    response: Option<Result<Vec<Document>, TransportError>>,
}

#[derive(Default)]
struct FakeState {
    documents: Vec<Document>,
    list_calls: usize,
    upload_calls: usize,
    scripted_lists: VecDeque<ScriptedList>,
    upload_gate: Option<oneshot::Receiver<()>>,
    upload_failure: Option<TransportError>,
    list_failure: Option<TransportError>,
    next_id: u64,
}

/// Remote document store kept in memory.
#[derive(Clone, Default)]
pub struct FakeDocumentSource {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        let source = Self::new();
        source.inner.lock().unwrap().documents = documents;
        source
    }

    pub fn documents(&self) -> Vec<Document> {
        self.inner.lock().unwrap().documents.clone()
    }

    pub fn set_documents(&self, documents: Vec<Document>) {
        self.inner.lock().unwrap().documents = documents;
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    pub fn upload_calls(&self) -> usize {
        self.inner.lock().unwrap().upload_calls
    }

    /// The next list call answers with `response` once the returned sender fires.
    pub fn gate_next_list(&self, response: Vec<Document>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().scripted_lists.push_back(ScriptedList {
            gate: Some(rx),
            response: Some(Ok(response)),
        });
        tx
    }

    /// Like `gate_next_list`, but the held-back response is a failure.
    pub fn gate_next_list_error(&self, err: TransportError) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().scripted_lists.push_back(ScriptedList {
            gate: Some(rx),
            response: Some(Err(err)),
        });
        tx
    }

    /// The next upload call waits until the returned sender fires.
    pub fn gate_upload(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().upload_gate = Some(rx);
        tx
    }

    pub fn fail_uploads(&self, err: TransportError) {
        self.inner.lock().unwrap().upload_failure = Some(err);
    }

    pub fn fail_lists(&self, err: TransportError) {
        self.inner.lock().unwrap().list_failure = Some(err);
    }

    pub async fn wait_for_list_calls(&self, count: usize) {
        while self.list_calls() < count {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_upload_calls(&self, count: usize) {
        while self.upload_calls() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl DocumentSource for FakeDocumentSource {
    async fn list_documents(&self) -> Result<Vec<Document>, TransportError> {
        let (gate, response) = {
            let mut state = self.inner.lock().unwrap();
            state.list_calls += 1;
            match state.scripted_lists.pop_front() {
                Some(scripted) => (scripted.gate, scripted.response),
                None => (None, None),
            }
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(response) = response {
            return response;
        }

        let state = self.inner.lock().unwrap();
        match &state.list_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.documents.clone()),
        }
    }

    async fn upload_document(
        &self,
        _bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Document, TransportError> {
        let gate = {
            let mut state = self.inner.lock().unwrap();
            state.upload_calls += 1;
            state.upload_gate.take()
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut state = self.inner.lock().unwrap();
        if let Some(err) = state.upload_failure.clone() {
            return Err(err);
        }
        state.next_id += 1;
        let doc = document(&format!("doc-{}", state.next_id), filename);
        state.documents.push(doc.clone());
        Ok(doc)
    }
}

/// Renderer reporting fixed page counts per url.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, u32>,
}

impl FakeRenderer {
    pub fn with_pages(url: &str, count: u32) -> Self {
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), count);
        Self { pages }
    }
}

#[async_trait]
impl DocumentRenderer for FakeRenderer {
    async fn page_count(&self, url: &str) -> Result<u32, TransportError> {
        self.pages
            .get(url)
            .copied()
            .ok_or_else(|| TransportError::Decode(format!("cannot render {url}")))
    }
}

/// Chat reply source that answers "Answer to: <question>" once released.
#[derive(Clone, Default)]
pub struct GatedResponder {
    gate: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
    failure: Arc<Mutex<Option<TransportError>>>,
    questions: Arc<Mutex<Vec<(String, String)>>>,
}

impl GatedResponder {
    pub fn gate_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn fail_with(&self, err: TransportError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// `(question, document name)` pairs received so far.
    pub fn questions(&self) -> Vec<(String, String)> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatResponder for GatedResponder {
    async fn reply(&self, question: &str, document_name: &str) -> Result<String, TransportError> {
        self.questions
            .lock()
            .unwrap()
            .push((question.to_string(), document_name.to_string()));
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(format!("Answer to: {question}"))
    }
}

/// Yield until `condition` holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}

/// Workspace over `source` with default settings and the given reset delay.
pub fn workspace_with(source: &FakeDocumentSource, reset_delay: Option<Duration>) -> Workspace {
    Workspace::builder(Arc::new(source.clone()))
        .session_reset_delay(reset_delay)
        .build()
}

pub fn workspace_with_responder(
    source: &FakeDocumentSource,
    responder: &GatedResponder,
) -> Workspace {
    Workspace::builder(Arc::new(source.clone()))
        .responder(Arc::new(responder.clone()))
        .session_reset_delay(None)
        .build()
}
