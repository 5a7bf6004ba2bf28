use std::path::{Component, Path};

use anyhow::Context;
use pdfchat_core::{UploadFile, UploadPhase, UploadSession, PDF_CONTENT_TYPE};
use pdfchat_workspace::WorkspaceSnapshot;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Declared media type for a local file, from its extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_CONTENT_TYPE,
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Read a local file into an upload candidate.
pub fn load_upload_file(path: &Path) -> anyhow::Result<UploadFile> {
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        anyhow::bail!("Refusing path with '..' components: {}", path.display());
    }

    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Path has no usable file name: {}", path.display()))?
        .to_string();
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(UploadFile::new(filename, guess_content_type(path), bytes))
}

pub fn progress_line(session: &UploadSession) -> String {
    format!("upload: {:?} {}%", session.phase, session.progress)
}

/// Reports upload phase and progress changes from workspace snapshots.
pub struct ProgressPrinter {
    finish: oneshot::Sender<UploadSession>,
    handle: JoinHandle<()>,
}

impl ProgressPrinter {
    pub fn spawn<F>(mut rx: watch::Receiver<WorkspaceSnapshot>, mut emit: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let (finish, mut finished) = oneshot::channel::<UploadSession>();
        let handle = tokio::spawn(async move {
            let mut last = (UploadPhase::Idle, 0);
            let mut report = |session: &UploadSession| {
                if (session.phase, session.progress) != last {
                    emit(progress_line(session));
                    last = (session.phase, session.progress);
                }
            };
            loop {
                tokio::select! {
                    biased;
                    session = &mut finished => {
                        if let Ok(session) = session {
                            report(&session);
                        }
                        break;
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let session = rx.borrow_and_update().upload.clone();
                        report(&session);
                    }
                }
            }
        });
        Self { finish, handle }
    }

    /// Report `last` unless it was already shown, then stop the printer.
    pub async fn finish(self, last: UploadSession) {
        let _ = self.finish.send(last);
        let _ = self.handle.await;
    }
}

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
