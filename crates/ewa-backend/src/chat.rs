//! Chat transcript kept next to the open analysis.
//!
//! The session is UI-local: it lives only as long as the viewer process and
//! starts over whenever a different analysis is opened.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::backend::ChatRequest;
use crate::mcp_api::ChatTranscriptResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub text: String,
    pub is_user: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    file: Option<String>,
    messages: Vec<ChatMessage>,
    input_draft: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.input_draft
    }

    /// Bind the session to `file`. Returns `true` if that cleared a transcript
    /// belonging to another analysis (or the first bind).
    pub fn bind(&mut self, file: &str) -> bool {
        if self.file.as_deref() == Some(file) {
            return false;
        }
        self.reset();
        self.file = Some(file.to_string());
        true
    }

    /// Clear the transcript and draft, keeping the bound analysis.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.input_draft.clear();
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.input_draft = text.into();
    }

    /// Return the draft and leave it empty.
    pub fn take_draft(&mut self) -> String {
        std::mem::take(&mut self.input_draft)
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            text: text.into(),
            is_user: true,
        });
    }

    pub fn push_reply(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            text: text.into(),
            is_user: false,
        });
    }

    /// Backend request for `message` in the context of the bound analysis.
    pub fn request(&self, message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            file_name: self.file.clone(),
        }
    }

    pub fn transcript(&self) -> ChatTranscriptResponse {
        ChatTranscriptResponse {
            file: self.file.clone(),
            messages: self.messages.clone(),
            input_draft: self.input_draft.clone(),
        }
    }
}
