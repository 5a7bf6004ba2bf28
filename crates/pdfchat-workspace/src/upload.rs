//! Upload pipeline: validate, transfer with simulated progress, refresh, reset.

use std::time::Duration;

use pdfchat_core::{Document, UploadError, UploadFile, UploadSession, WorkspaceError};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::store::{log_error, Workspace};

/// Releases the pipeline when an upload ends, including when its future is dropped.
struct UploadGuard<'a> {
    workspace: &'a Workspace,
    attempt: u64,
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        let attempt = self.attempt;
        self.workspace.mutate(|state| {
            if state.upload_attempt != attempt {
                return;
            }
            state.upload_in_flight = false;
            if !state.upload.phase.is_terminal() {
                tracing::debug!(attempt, "Upload abandoned before completion");
                state.upload = UploadSession::default();
            }
        });
    }
}

impl Workspace {
    /// Validate `file`, send it to the remote store and refresh the document list.
    ///
    /// Only one upload runs at a time; a second call while one is in flight fails with
    /// `UploadError::Busy` and leaves the running session alone.
    #[tracing::instrument(skip(self, file), fields(filename = %file.filename, size = file.size_bytes()))]
    pub async fn upload_file(&self, file: UploadFile) -> Result<Document, UploadError> {
        let attempt = self.mutate(|state| {
            if state.upload_in_flight {
                return Err(UploadError::Busy);
            }
            state.upload_in_flight = true;
            state.upload_attempt += 1;
            state.last_error = None;
            state.upload = UploadSession::validating(&file.filename);
            Ok(state.upload_attempt)
        });
        let attempt = match attempt {
            Ok(attempt) => attempt,
            Err(err) => {
                log_error(&WorkspaceError::from(err.clone()));
                return Err(err);
            }
        };
        let guard = UploadGuard {
            workspace: self,
            attempt,
        };

        if let Err(e) = self.shared.policy.validate(&file.info()) {
            let err = UploadError::from(e);
            self.fail_upload(&err);
            drop(guard);
            self.schedule_session_reset(attempt);
            return Err(err);
        }

        let progress = &self.shared.progress;
        let initial = progress.initial();
        self.mutate(|state| state.upload.begin_transfer(initial));
        tracing::debug!(progress = initial, "Upload started");

        let UploadFile {
            filename, bytes, ..
        } = file;
        let mut upload = self.shared.source.upload_document(bytes, &filename);

        let tick = progress.tick().max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;
                result = &mut upload => break result,
                _ = ticker.tick() => {
                    self.mutate(|state| {
                        let next = progress.next(state.upload.progress);
                        state.upload.advance(next);
                    });
                }
            }
        };

        let document = match result {
            Ok(document) => document,
            Err(e) => {
                let err = UploadError::Transport(e);
                self.fail_upload(&err);
                drop(guard);
                self.schedule_session_reset(attempt);
                return Err(err);
            }
        };

        self.mutate(|state| state.upload.succeed());
        tracing::info!(id = %document.id, url = %document.url, "Upload complete");

        // The document exists remotely, so a failed refresh does not fail the upload.
        if let Err(e) = self.refresh_list().await {
            tracing::warn!(error = %e, "Refresh after upload failed");
        }

        drop(guard);
        self.schedule_session_reset(attempt);
        Ok(document)
    }

    fn fail_upload(&self, err: &UploadError) {
        self.mutate(|state| {
            if let Some(session_error) = err.session_error() {
                state.upload.fail(session_error);
            }
            state.record_error(&WorkspaceError::from(err.clone()));
        });
    }
}
