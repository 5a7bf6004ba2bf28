//! Chat transcript for the selected document.

use std::time::Duration;

use async_trait::async_trait;
use pdfchat_core::{ChatError, ChatMessage, ChatResponder, TransportError};
use serde::Serialize;

pub const PLACEHOLDER_REPLY: &str =
    "This is a placeholder response. The LLM integration will be implemented later.";

const PLACEHOLDER_DELAY_MS: u64 = 1000;

/// Transcript plus the single outstanding request, if any.
///
/// `epoch` advances every time the transcript is reset so replies that were requested
/// under an earlier selection can be recognised and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
    #[serde(skip)]
    epoch: u64,
}

impl ChatSession {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Append the user's message and mark a reply as pending.
    pub fn begin(&mut self, question: ChatMessage) -> Result<u64, ChatError> {
        if self.pending {
            return Err(ChatError::Busy);
        }
        self.messages.push(question);
        self.pending = true;
        Ok(self.epoch)
    }

    /// Append the reply to the request started in `epoch`.
    pub fn complete(&mut self, epoch: u64, reply: ChatMessage) -> Result<(), ChatError> {
        if epoch != self.epoch {
            return Err(ChatError::SelectionChanged);
        }
        self.messages.push(reply);
        self.pending = false;
        Ok(())
    }

    /// Clear the pending flag after a failed request. False if the request is stale.
    pub fn abort(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.pending = false;
        true
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending = false;
        self.epoch += 1;
    }
}

/// Local stand-in for the reply service: answers every question with a fixed text.
#[derive(Debug, Clone)]
pub struct PlaceholderResponder {
    delay: Duration,
}

impl Default for PlaceholderResponder {
    fn default() -> Self {
        Self::new(Duration::from_millis(PLACEHOLDER_DELAY_MS))
    }
}

impl PlaceholderResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ChatResponder for PlaceholderResponder {
    async fn reply(&self, _question: &str, document_name: &str) -> Result<String, TransportError> {
        tracing::debug!(document = %document_name, "Answering with placeholder reply");
        tokio::time::sleep(self.delay).await;
        Ok(PLACEHOLDER_REPLY.to_string())
    }
}
