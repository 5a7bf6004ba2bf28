//! Error types module
//!
//! The workspace distinguishes three families of failure: local validation of an upload
//! candidate, transport failures talking to the remote store, and consistency
//! violations (a caller selecting a document the registry does not hold). Action-level
//! errors (`UploadError`, `ChatError`) wrap those, and `WorkspaceError` unifies them for
//! the observable `last_error` field and for callers that do not care which action failed.

use serde::Serialize;

use crate::models::{SessionError, UploadErrorKind};

const BYTES_PER_KB: u64 = 1024;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Human-readable size limit: whole MB, then KB, then bytes.
fn format_limit(bytes: u64) -> String {
    if bytes >= BYTES_PER_MB {
        format!("{}MB", bytes / BYTES_PER_MB)
    } else if bytes >= BYTES_PER_KB {
        format!("{}KB", bytes / BYTES_PER_KB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected actions and caller mistakes
    Warn,
    /// Error level - for remote failures
    Error,
}

/// Metadata describing how an error should be presented to a user surface.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the user can usefully retry (drives the "Try again" affordance)
    fn is_recoverable(&self) -> bool;

    /// Message suitable for display
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Local rejection of an upload candidate. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid content type: {content_type} (expected: {expected})")]
    InvalidContentType {
        content_type: String,
        expected: String,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
}

impl ValidationError {
    pub fn kind(&self) -> UploadErrorKind {
        match self {
            ValidationError::InvalidContentType { .. } => UploadErrorKind::Type,
            ValidationError::FileTooLarge { .. } => UploadErrorKind::Size,
        }
    }
}

/// Failure talking to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send request: {0}")]
    Request(String),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

/// Attempted selection of a document the registry does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Document is not in the registry: {url}")]
pub struct ConsistencyViolation {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upload failed: {0}")]
    Transport(#[from] TransportError),

    #[error("An upload is already in progress")]
    Busy,
}

impl UploadError {
    /// Session error for the failed phase. `Busy` never touches the session.
    pub fn session_error(&self) -> Option<SessionError> {
        let kind = match self {
            UploadError::Validation(err) => err.kind(),
            UploadError::Transport(_) => UploadErrorKind::Transport,
            UploadError::Busy => return None,
        };
        Some(SessionError {
            message: WorkspaceError::from(self.clone()).client_message(),
            kind,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("No document is selected")]
    NoDocument,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("A reply is already pending")]
    Busy,

    #[error("Selection changed before the reply arrived")]
    SelectionChanged,

    #[error("Chat request failed: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upload failed: {0}")]
    Upload(#[source] TransportError),

    #[error("Failed to fetch documents: {0}")]
    Fetch(#[source] TransportError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyViolation),

    #[error("An upload is already in progress")]
    UploadBusy,

    #[error(transparent)]
    Chat(ChatError),
}

impl From<UploadError> for WorkspaceError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(e) => WorkspaceError::Validation(e),
            UploadError::Transport(e) => WorkspaceError::Upload(e),
            UploadError::Busy => WorkspaceError::UploadBusy,
        }
    }
}

impl From<ChatError> for WorkspaceError {
    fn from(err: ChatError) -> Self {
        WorkspaceError::Chat(err)
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn workspace_error_static_metadata(err: &WorkspaceError) -> (&'static str, bool, LogLevel) {
    match err {
        WorkspaceError::Validation(ValidationError::InvalidContentType { .. }) => {
            ("INVALID_CONTENT_TYPE", false, LogLevel::Debug)
        }
        WorkspaceError::Validation(ValidationError::FileTooLarge { .. }) => {
            ("FILE_TOO_LARGE", false, LogLevel::Debug)
        }
        WorkspaceError::Upload(_) => ("UPLOAD_FAILED", true, LogLevel::Error),
        WorkspaceError::Fetch(_) => ("FETCH_FAILED", true, LogLevel::Error),
        WorkspaceError::Consistency(_) => ("CONSISTENCY_VIOLATION", false, LogLevel::Warn),
        WorkspaceError::UploadBusy => ("UPLOAD_BUSY", true, LogLevel::Warn),
        WorkspaceError::Chat(ChatError::Transport(_)) => ("CHAT_FAILED", true, LogLevel::Error),
        WorkspaceError::Chat(ChatError::Busy) => ("CHAT_BUSY", true, LogLevel::Warn),
        WorkspaceError::Chat(ChatError::SelectionChanged) => {
            ("CHAT_SELECTION_CHANGED", false, LogLevel::Debug)
        }
        WorkspaceError::Chat(ChatError::NoDocument) => ("CHAT_NO_DOCUMENT", false, LogLevel::Warn),
        WorkspaceError::Chat(ChatError::EmptyMessage) => {
            ("CHAT_EMPTY_MESSAGE", false, LogLevel::Debug)
        }
    }
}

impl ErrorMetadata for WorkspaceError {
    fn error_code(&self) -> &'static str {
        workspace_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        workspace_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        workspace_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            WorkspaceError::Validation(ValidationError::InvalidContentType { .. }) => {
                "Only PDF files are allowed".to_string()
            }
            WorkspaceError::Validation(ValidationError::FileTooLarge { max, .. }) => {
                format!("File size should be less than {}", format_limit(*max))
            }
            WorkspaceError::Upload(_) => "Failed to upload file. Please try again.".to_string(),
            WorkspaceError::Fetch(_) => "Failed to fetch PDFs".to_string(),
            WorkspaceError::Consistency(_) => "Selected document is not available".to_string(),
            WorkspaceError::UploadBusy => "An upload is already in progress".to_string(),
            WorkspaceError::Chat(ChatError::Transport(_)) => {
                "Failed to get a reply. Please try again.".to_string()
            }
            WorkspaceError::Chat(err) => err.to_string(),
        }
    }
}

/// Snapshot-friendly record of the last failure, kept so late subscribers can see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
    pub detail: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<UploadErrorKind>,
}

impl From<&WorkspaceError> for ErrorReport {
    fn from(err: &WorkspaceError) -> Self {
        let kind = match err {
            WorkspaceError::Validation(e) => Some(e.kind()),
            WorkspaceError::Upload(_) => Some(UploadErrorKind::Transport),
            _ => None,
        };
        ErrorReport {
            code: err.error_code(),
            message: err.client_message(),
            detail: err.to_string(),
            recoverable: err.is_recoverable(),
            kind,
        }
    }
}
