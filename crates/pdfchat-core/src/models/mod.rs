pub mod chat;
pub mod document;
pub mod upload;

pub use chat::{ChatMessage, ChatRole};
pub use document::Document;
pub use upload::{
    FileInfo, SessionError, UploadErrorKind, UploadFile, UploadPhase, UploadSession,
};
