use std::time::Duration;

use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::mcp_api::FileEntry;

#[derive(Clone, Debug)]
pub struct BackendClientConfig {
    /// Base URL of the backend, without a trailing `/`.
    pub api_base: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl BackendClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(5_000),
            max_error_body_bytes: 8 * 1024,
        }
    }

    /// Defaults for `api_base`, overridden by any `EWA_*` tuning variables that parse.
    pub fn from_env(api_base: impl Into<String>) -> Self {
        let defaults = Self::new(api_base);
        Self {
            timeout: env_parse::<u64>("EWA_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: env_parse::<u32>("EWA_MAX_RETRIES").unwrap_or(defaults.max_retries),
            initial_backoff: env_parse::<u64>("EWA_RETRY_INITIAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: env_parse::<u64>("EWA_RETRY_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
            max_error_body_bytes: env_parse::<usize>("EWA_MAX_ERROR_BODY_BYTES")
                .unwrap_or(defaults.max_error_body_bytes),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Analysis the question is about, if one is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(alias = "reply")]
    pub response: String,
}

/// `GET /api/files` returns either `[...]` or `{"files": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileListing {
    Wrapped { files: Vec<FileListingEntry> },
    Bare(Vec<FileListingEntry>),
}

/// A listing entry is either a bare name or a record with a `name`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileListingEntry {
    Name(String),
    Record(FileEntry),
}

impl FileListing {
    fn into_entries(self) -> Vec<FileEntry> {
        let entries = match self {
            FileListing::Wrapped { files } => files,
            FileListing::Bare(files) => files,
        };
        entries
            .into_iter()
            .map(|entry| match entry {
                FileListingEntry::Name(name) => FileEntry {
                    name,
                    details: Default::default(),
                },
                FileListingEntry::Record(record) => record,
            })
            .collect()
    }
}

/// Error bodies look like `{"error": "..."}` or `{"message": "..."}`.
#[derive(Debug, Deserialize)]
struct BackendErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

/// Whether the backend may act on a request more than once without harm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Idempotency {
    /// Reads: safe to repeat after any transient failure.
    Idempotent,
    /// `POST /api/chat`: a repeat could ask the LLM the same question twice,
    /// so only failures where the request was certainly not processed retry.
    NonIdempotent,
}

#[derive(Clone)]
pub struct BackendClient {
    config: BackendClientConfig,
    base: Url,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: BackendClientConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.api_base).map_err(|e| BackendError::InvalidUrl {
            url: config.api_base.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl {
                url: config.api_base.clone(),
                reason: "URL cannot be a base".to_string(),
            });
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("ewa-viewer/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, base, http })
    }

    pub fn config(&self) -> &BackendClientConfig {
        &self.config
    }

    /// `{api_base}/api/{segments...}`, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejected cannot-be-a-base URLs, so the segments are always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    /// List the uploaded files and analyses.
    pub async fn list_files(&self) -> Result<Vec<FileEntry>, BackendError> {
        let url = self.endpoint(&["files"]);
        let listing: FileListing = self
            .send(Idempotency::Idempotent, "list_files", || async {
                let resp = self.http.get(url.clone()).send().await?;
                self.json_body(resp).await
            })
            .await?;
        Ok(listing.into_entries())
    }

    /// Download the analysis artifact `name` as text.
    pub async fn download(&self, name: &str) -> Result<String, BackendError> {
        let url = self.endpoint(&["download", name]);
        let text = self
            .send(Idempotency::Idempotent, "download", || async {
                let resp = self.http.get(url.clone()).send().await?;
                if !resp.status().is_success() {
                    return Err(self.upstream_error(resp).await);
                }
                Ok(resp.text().await?)
            })
            .await?;
        debug!(name, bytes = text.len(), "downloaded analysis");
        Ok(text)
    }

    /// Relay one chat message to the backend LLM endpoint.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        let url = self.endpoint(&["chat"]);
        self.send(Idempotency::NonIdempotent, "chat", || async {
            let resp = self.http.post(url.clone()).json(request).send().await?;
            self.json_body(resp).await
        })
        .await
    }

    async fn json_body<T: for<'de> Deserialize<'de>>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, BackendError> {
        if !resp.status().is_success() {
            return Err(self.upstream_error(resp).await);
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !is_json_content_type(content_type.as_deref()) {
            return Err(BackendError::UnexpectedContentType { content_type });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn upstream_error(&self, resp: reqwest::Response) -> BackendError {
        let status = resp.status();
        let body = read_error_body(resp, self.config.max_error_body_bytes).await;
        upstream_error(status, body)
    }

    /// Run `attempt` until it succeeds, fails permanently, or the retry budget is spent.
    async fn send<T, Fut, F>(
        &self,
        idempotency: Idempotency,
        op: &'static str,
        mut attempt: F,
    ) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, BackendError>>,
    {
        let mut retries: u32 = 0;
        loop {
            match attempt().await {
                Err(e) if retries < self.config.max_retries && is_transient(&e, idempotency) => {
                    let delay = self.config.retry_delay(retries);
                    retries += 1;
                    warn!(
                        op,
                        retry = retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "backend request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

impl BackendClientConfig {
    /// Wait before retry number `retry` (0-based): doubling from
    /// `initial_backoff`, capped at `max_backoff`, plus up to 25% jitter.
    fn retry_delay(&self, retry: u32) -> Duration {
        let base = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_backoff);
        let jitter_ms = (base.as_millis() as u64 / 4).max(1);
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        mime == "application/json" || mime.ends_with("+json")
    })
}

fn upstream_error(status: StatusCode, body: String) -> BackendError {
    if let Ok(parsed) = serde_json::from_str::<BackendErrorEnvelope>(&body) {
        if let Some(message) = parsed.error.or(parsed.message) {
            return BackendError::Upstream { status, message };
        }
    }
    BackendError::UpstreamBody { status, body }
}

fn is_transient(err: &BackendError, idempotency: Idempotency) -> bool {
    match (err, idempotency) {
        // The connection never came up, so nothing was processed.
        (BackendError::Request(e), _) if e.is_connect() => true,
        (BackendError::Request(e), Idempotency::Idempotent) => e.is_timeout() || e.is_body(),
        (BackendError::Upstream { status, .. } | BackendError::UpstreamBody { status, .. }, _)
            if *status == StatusCode::TOO_MANY_REQUESTS
                || *status == StatusCode::SERVICE_UNAVAILABLE =>
        {
            true
        }
        (
            BackendError::Upstream { status, .. } | BackendError::UpstreamBody { status, .. },
            Idempotency::Idempotent,
        ) => status.is_server_error(),
        _ => false,
    }
}

/// Read at most `max_bytes` of an error body without buffering the rest.
async fn read_error_body(mut resp: reqwest::Response, max_bytes: usize) -> String {
    let mut body: Vec<u8> = Vec::new();
    while body.len() < max_bytes {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(max_bytes - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, read = body.len(), "backend error body cut short");
                break;
            }
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
