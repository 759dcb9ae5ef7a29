//! Errors talking to the EWA analysis backend.
//!
//! The document transform itself never fails; everything here is about the
//! HTTP contracts (`/api/files`, `/api/download/:name`, `/api/chat`) the
//! viewer reads from.
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid backend URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("backend returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("backend returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("expected a JSON response, got content type {content_type:?}")]
    UnexpectedContentType { content_type: Option<String> },
}
