//! PDF Chat Core Library
//!
//! This crate provides the domain models, error types, configuration, validation
//! policy and remote-source traits shared by the workspace store, the HTTP client
//! and the command-line surface.

pub mod config;
pub mod error;
pub mod models;
pub mod source;
pub mod validation;

// Re-export commonly used types
pub use config::{ClientConfig, Config, ProgressConfig, WorkspaceConfig};
pub use error::{
    ChatError, ConsistencyViolation, ErrorMetadata, ErrorReport, LogLevel, TransportError,
    UploadError, ValidationError, WorkspaceError,
};
pub use models::{
    ChatMessage, ChatRole, Document, FileInfo, SessionError, UploadErrorKind, UploadFile,
    UploadPhase, UploadSession,
};
pub use source::{ChatResponder, DocumentRenderer, DocumentSource};
pub use validation::{ValidationPolicy, MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE};
