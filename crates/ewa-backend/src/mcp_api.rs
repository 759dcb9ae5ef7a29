use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chat::ChatMessage;

/// An uploaded file or analysis artifact known to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileEntry {
    /// File name, usable with `open_analysis`.
    pub name: String,
    /// Whatever else the backend reports about the file (size, timestamps, ...).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OpenAnalysisParams {
    /// Name of the analysis artifact as returned by `list_analyses`.
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RenderMarkdownParams {
    /// Report markdown in the EWA analysis dialect.
    pub markdown: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SendChatParams {
    /// Question to relay. When omitted, the saved draft is sent.
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveDraftParams {
    /// Unsent chat input to keep for the open analysis.
    pub text: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AnalysisListResponse {
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ChatReplyResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatTranscriptResponse {
    /// Analysis the session is bound to, if any.
    pub file: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub input_draft: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct OkResponse {
    pub ok: bool,
}
