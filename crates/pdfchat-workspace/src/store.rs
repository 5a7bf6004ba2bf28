//! Workspace store.
//!
//! `Workspace` is an explicitly constructed, cheaply clonable handle over one shared
//! state object. Every action locks the state briefly, applies its synchronous part and
//! publishes a new `WorkspaceSnapshot` to subscribers before the lock is released. The
//! lock is never held across an `.await`.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pdfchat_core::{
    ChatError, ChatMessage, ChatResponder, ChatRole, Document, DocumentRenderer, DocumentSource,
    ErrorMetadata, ErrorReport, LogLevel, TransportError, UploadSession, ValidationPolicy,
    WorkspaceConfig, WorkspaceError,
};
use serde::Serialize;
use tokio::sync::watch;

use crate::chat::{ChatSession, PlaceholderResponder};
use crate::progress::{ProgressEstimator, SimulatedProgress};
use crate::registry::DocumentRegistry;
use crate::viewer::ViewerState;

/// Read-only view of the workspace published after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub documents: Vec<Document>,
    pub selected_document_url: Option<String>,
    /// A list fetch issued last is still outstanding.
    pub loading: bool,
    pub upload: UploadSession,
    pub viewer: ViewerState,
    pub chat: ChatSession,
    pub last_error: Option<ErrorReport>,
}

impl WorkspaceSnapshot {
    pub fn selected_document(&self) -> Option<&Document> {
        let url = self.selected_document_url.as_deref()?;
        self.documents.iter().find(|doc| doc.url == url)
    }
}

/// How a list refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the registry contents.
    Applied,
    /// A newer refresh was issued before this one resolved; its response was dropped.
    Superseded,
}

#[derive(Debug, Default)]
pub(crate) struct WorkspaceState {
    pub(crate) registry: DocumentRegistry,
    pub(crate) viewer: ViewerState,
    pub(crate) upload: UploadSession,
    /// An upload holds the pipeline, from validation until its refresh has finished.
    pub(crate) upload_in_flight: bool,
    pub(crate) upload_attempt: u64,
    pub(crate) chat: ChatSession,
    pub(crate) last_error: Option<ErrorReport>,
    list_generation: u64,
    loading: bool,
}

impl WorkspaceState {
    fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            documents: self.registry.list().to_vec(),
            selected_document_url: self.registry.selected().map(str::to_string),
            loading: self.loading,
            upload: self.upload.clone(),
            viewer: self.viewer.clone(),
            chat: self.chat.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) fn record_error(&mut self, err: &WorkspaceError) {
        log_error(err);
        self.last_error = Some(ErrorReport::from(err));
    }

    /// Reset everything bound to the selected document.
    fn selection_changed(&mut self) {
        self.viewer = match self.registry.selected() {
            Some(url) => ViewerState::open(url),
            None => ViewerState::NoDocument,
        };
        self.chat.reset();
    }
}

pub(crate) fn log_error(err: &WorkspaceError) {
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(code, error = %err, "Workspace action failed"),
        LogLevel::Warn => tracing::warn!(code, error = %err, "Workspace action rejected"),
        LogLevel::Error => tracing::error!(code, error = %err, "Workspace action failed"),
    }
}

pub(crate) struct Shared {
    state: Mutex<WorkspaceState>,
    snapshots: watch::Sender<WorkspaceSnapshot>,
    pub(crate) source: Arc<dyn DocumentSource>,
    responder: Arc<dyn ChatResponder>,
    pub(crate) policy: ValidationPolicy,
    pub(crate) progress: Arc<dyn ProgressEstimator>,
    pub(crate) session_reset_delay: Option<Duration>,
}

/// Handle to the workspace. Clones share the same state.
#[derive(Clone)]
pub struct Workspace {
    pub(crate) shared: Arc<Shared>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("snapshot", &*self.shared.snapshots.borrow())
            .finish_non_exhaustive()
    }
}

pub struct WorkspaceBuilder {
    source: Arc<dyn DocumentSource>,
    responder: Option<Arc<dyn ChatResponder>>,
    policy: ValidationPolicy,
    progress: Arc<dyn ProgressEstimator>,
    session_reset_delay: Option<Duration>,
}

impl WorkspaceBuilder {
    fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self::from_config(source, &WorkspaceConfig::default())
    }

    fn from_config(source: Arc<dyn DocumentSource>, config: &WorkspaceConfig) -> Self {
        Self {
            source,
            responder: None,
            policy: ValidationPolicy::from_config(config),
            progress: Arc::new(SimulatedProgress::from_config(&config.progress)),
            session_reset_delay: config.session_reset_delay,
        }
    }

    /// Apply validation, progress and reset settings from configuration.
    pub fn config(self, config: &WorkspaceConfig) -> Self {
        Self {
            responder: self.responder,
            ..Self::from_config(self.source, config)
        }
    }

    pub fn responder(mut self, responder: Arc<dyn ChatResponder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn progress_estimator(mut self, progress: Arc<dyn ProgressEstimator>) -> Self {
        self.progress = progress;
        self
    }

    /// `None` keeps a finished upload session visible until the next upload.
    pub fn session_reset_delay(mut self, delay: Option<Duration>) -> Self {
        self.session_reset_delay = delay;
        self
    }

    pub fn build(self) -> Workspace {
        let (snapshots, _) = watch::channel(WorkspaceSnapshot::default());
        let responder = self
            .responder
            .unwrap_or_else(|| Arc::new(PlaceholderResponder::default()));

        Workspace {
            shared: Arc::new(Shared {
                state: Mutex::new(WorkspaceState::default()),
                snapshots,
                source: self.source,
                responder,
                policy: self.policy,
                progress: self.progress,
                session_reset_delay: self.session_reset_delay,
            }),
        }
    }
}

impl Workspace {
    pub fn builder(source: Arc<dyn DocumentSource>) -> WorkspaceBuilder {
        WorkspaceBuilder::new(source)
    }

    pub fn new(
        source: Arc<dyn DocumentSource>,
        responder: Arc<dyn ChatResponder>,
        config: &WorkspaceConfig,
    ) -> Self {
        Self::builder(source)
            .config(config)
            .responder(responder)
            .build()
    }

    /// Apply a change under the lock and publish the resulting snapshot.
    ///
    /// Subscribers are only notified when the snapshot actually differs.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut WorkspaceState) -> R) -> R {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut state);
        let next = state.snapshot();
        self.shared.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        result
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&WorkspaceState) -> R) -> R {
        let state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Receive every published snapshot from now on. The current one is marked seen.
    pub fn subscribe(&self) -> watch::Receiver<WorkspaceSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    pub fn validation_policy(&self) -> &ValidationPolicy {
        &self.shared.policy
    }

    /// Select a document by url, or clear the selection with `None`.
    ///
    /// A change resets the viewer and the chat transcript. Selecting the current
    /// document again changes nothing.
    pub fn select_document(&self, url: Option<&str>) -> Result<(), WorkspaceError> {
        self.mutate(|state| match state.registry.select(url) {
            Ok(true) => {
                state.selection_changed();
                tracing::debug!(url = ?url, "Selection changed");
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(violation) => {
                let err = WorkspaceError::from(violation);
                state.record_error(&err);
                Err(err)
            }
        })
    }

    /// Replace the document list from the remote source.
    ///
    /// Only the most recently issued refresh is applied; older ones resolve as
    /// `Superseded` and their errors are dropped.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_list(&self) -> Result<RefreshOutcome, WorkspaceError> {
        let generation = self.mutate(|state| {
            state.list_generation += 1;
            state.loading = true;
            state.last_error = None;
            state.list_generation
        });

        let result = self.shared.source.list_documents().await;

        self.mutate(|state| {
            if generation != state.list_generation {
                tracing::debug!(
                    generation,
                    latest = state.list_generation,
                    "Dropping superseded list response"
                );
                return Ok(RefreshOutcome::Superseded);
            }
            state.loading = false;

            match result {
                Ok(documents) => {
                    if state.registry.replace(documents) {
                        state.selection_changed();
                    }
                    tracing::info!(count = state.registry.len(), "Document list refreshed");
                    Ok(RefreshOutcome::Applied)
                }
                Err(e) => {
                    let err = WorkspaceError::Fetch(e);
                    state.record_error(&err);
                    Err(err)
                }
            }
        })
    }

    pub fn next_page(&self) -> bool {
        self.mutate(|state| state.viewer.next_page())
    }

    pub fn prev_page(&self) -> bool {
        self.mutate(|state| state.viewer.prev_page())
    }

    pub fn zoom_in(&self) -> bool {
        self.mutate(|state| state.viewer.zoom_in())
    }

    pub fn zoom_out(&self) -> bool {
        self.mutate(|state| state.viewer.zoom_out())
    }

    /// Feed the renderer's page count for `url` into the viewer.
    ///
    /// Reports for a document that is no longer selected are ignored.
    pub fn document_loaded(&self, url: &str, page_count: u32) -> bool {
        let applied = self.mutate(|state| state.viewer.document_loaded(url, page_count));
        if applied {
            tracing::debug!(url = %url, page_count, "Document loaded");
        } else {
            tracing::warn!(url = %url, page_count, "Ignoring page count for a document not being viewed");
        }
        applied
    }

    /// Ask `renderer` for the selected document's page count and apply it.
    ///
    /// Returns `None` when nothing is selected, or when the selection changed while the
    /// count was being read and it was not applied.
    pub async fn render_selected(
        &self,
        renderer: &dyn DocumentRenderer,
    ) -> Result<Option<u32>, TransportError> {
        let Some(url) = self.read(|state| state.registry.selected().map(str::to_string)) else {
            return Ok(None);
        };

        let page_count = renderer.page_count(&url).await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to render document");
            e
        })?;
        Ok(self
            .document_loaded(&url, page_count)
            .then_some(page_count))
    }

    /// Ask a question about the selected document and wait for the reply.
    ///
    /// The question stays in the transcript when the reply fails. A reply that arrives
    /// after the selection changed is dropped.
    #[tracing::instrument(skip(self, text))]
    pub async fn ask(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let question = text.trim();

        let (epoch, document) = self
            .mutate(|state| -> Result<(u64, Document), ChatError> {
                let document = state
                    .registry
                    .selected_document()
                    .cloned()
                    .ok_or(ChatError::NoDocument)?;
                if question.is_empty() {
                    return Err(ChatError::EmptyMessage);
                }
                let message = ChatMessage::new(ChatRole::User, question, document.url.clone());
                let epoch = state.chat.begin(message)?;
                Ok((epoch, document))
            })
            .map_err(|e| {
                log_error(&WorkspaceError::from(e.clone()));
                e
            })?;

        let result = self
            .shared
            .responder
            .reply(question, &document.filename)
            .await;

        self.mutate(|state| -> Result<ChatMessage, ChatError> {
            let answer = match result {
                Ok(answer) => answer,
                Err(e) => {
                    if !state.chat.abort(epoch) {
                        return Err(ChatError::SelectionChanged);
                    }
                    let err = ChatError::Transport(e);
                    state.record_error(&WorkspaceError::from(err.clone()));
                    return Err(err);
                }
            };

            let reply = ChatMessage::new(ChatRole::Assistant, answer, document.url.clone());
            if let Err(e) = state.chat.complete(epoch, reply.clone()) {
                tracing::debug!(url = %document.url, "Dropping reply for a previous selection");
                return Err(e);
            }
            tracing::info!(document = %document.filename, "Chat reply received");
            Ok(reply)
        })
    }

    /// Return the upload session to idle after the display delay, unless another
    /// upload has started since.
    pub(crate) fn schedule_session_reset(&self, attempt: u64) {
        let Some(delay) = self.shared.session_reset_delay else {
            return;
        };
        let shared = Arc::downgrade(&self.shared);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let workspace = Workspace { shared };
            workspace.mutate(|state| {
                if state.upload_attempt == attempt && state.upload.phase.is_terminal() {
                    state.upload = UploadSession::default();
                    tracing::debug!(attempt, "Upload session reset");
                }
            });
        });
    }
}
