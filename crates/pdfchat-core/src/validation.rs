//! Upload validation policy.
//!
//! Checks run in a fixed order and the first failing rule wins: content type, then size.
//! The policy is pure so it can be exercised without any I/O.

use crate::config::WorkspaceConfig;
use crate::error::ValidationError;
use crate::models::FileInfo;

/// The only media type accepted for upload.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Upload size ceiling (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    accepted_content_type: String,
    max_file_size: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new(PDF_CONTENT_TYPE, MAX_UPLOAD_BYTES)
    }
}

impl ValidationPolicy {
    pub fn new(accepted_content_type: impl Into<String>, max_file_size: u64) -> Self {
        Self {
            accepted_content_type: accepted_content_type.into(),
            max_file_size,
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(
            config.accepted_content_type.clone(),
            config.max_upload_bytes,
        )
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn accepted_content_type(&self) -> &str {
        &self.accepted_content_type
    }

    /// Validate content type. The declared type must match exactly.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        if content_type != self.accepted_content_type {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                expected: self.accepted_content_type.clone(),
            });
        }
        Ok(())
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate a candidate: type first, then size.
    pub fn validate(&self, file: &FileInfo) -> Result<(), ValidationError> {
        self.validate_content_type(&file.mime_type)?;
        self.validate_file_size(file.size_bytes)?;
        Ok(())
    }
}
