use serde::{Deserialize, Serialize};

/// Declared type and size of an upload candidate. All the validation policy looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub mime_type: String,
    pub size_bytes: u64,
}

/// A file picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadErrorKind {
    Size,
    Type,
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Validating,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadPhase::Succeeded | UploadPhase::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionError {
    pub message: String,
    pub kind: UploadErrorKind,
}

/// Observable state of the current upload attempt.
///
/// Progress is 0 while idle and after a failure, and only reaches 100 once the remote
/// store has confirmed the upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadSession {
    pub phase: UploadPhase,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl UploadSession {
    pub fn validating(filename: &str) -> Self {
        Self {
            phase: UploadPhase::Validating,
            progress: 0,
            filename: Some(filename.to_string()),
            error: None,
        }
    }

    pub fn begin_transfer(&mut self, initial: u8) {
        self.phase = UploadPhase::Uploading;
        self.progress = initial.clamp(1, 99);
    }

    /// Move progress forward while uploading. Never decreases, never reaches 100.
    pub fn advance(&mut self, next: u8) -> bool {
        if self.phase != UploadPhase::Uploading {
            return false;
        }
        let next = next.clamp(self.progress, 99);
        let changed = next != self.progress;
        self.progress = next;
        changed
    }

    pub fn succeed(&mut self) {
        self.phase = UploadPhase::Succeeded;
        self.progress = 100;
        self.error = None;
    }

    pub fn fail(&mut self, error: SessionError) {
        self.phase = UploadPhase::Failed;
        self.progress = 0;
        self.error = Some(error);
    }

    pub fn is_idle(&self) -> bool {
        self.phase == UploadPhase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploading(progress: u8) -> UploadSession {
        let mut session = UploadSession::validating("a.pdf");
        session.begin_transfer(progress);
        session
    }

    #[test]
    fn test_begin_transfer_is_nonzero() {
        let session = uploading(0);
        assert_eq!(session.phase, UploadPhase::Uploading);
        assert_eq!(session.progress, 1);
    }

    #[test]
    fn test_advance_never_decreases() {
        let mut session = uploading(50);
        assert!(!session.advance(30));
        assert_eq!(session.progress, 50);
    }

    #[test]
    fn test_advance_never_reaches_completion() {
        let mut session = uploading(90);
        session.advance(100);
        assert_eq!(session.progress, 99);
    }

    #[test]
    fn test_advance_ignored_outside_upload() {
        let mut session = UploadSession::validating("a.pdf");
        assert!(!session.advance(40));
        assert_eq!(session.progress, 0);
    }

    #[test]
    fn test_fail_resets_progress() {
        let mut session = uploading(60);
        session.fail(SessionError {
            message: "boom".to_string(),
            kind: UploadErrorKind::Transport,
        });
        assert_eq!(session.phase, UploadPhase::Failed);
        assert_eq!(session.progress, 0);
        assert!(session.phase.is_terminal());
    }

    #[test]
    fn test_succeed_sets_full_progress() {
        let mut session = uploading(60);
        session.succeed();
        assert_eq!(session.progress, 100);
        assert!(session.phase.is_terminal());
    }
}
