use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use ewa_backend::backend::BackendClient;
use ewa_backend::chat::ChatSession;
use ewa_backend::mcp_api::{
    AnalysisListResponse, ChatReplyResponse, ChatTranscriptResponse, OkResponse,
    OpenAnalysisParams, RenderMarkdownParams, SaveDraftParams, SendChatParams,
};
use ewa_document::{Document, DocumentTransformer};

use crate::cache::DocumentCache;
use crate::error::AppError;

#[derive(Clone)]
pub struct ViewerServer {
    backend: Arc<BackendClient>,
    transformer: Arc<DocumentTransformer>,
    cache: Arc<DocumentCache>,
    session: Arc<Mutex<ChatSession>>,
    tool_router: ToolRouter<ViewerServer>,
}

impl ViewerServer {
    pub fn new(
        backend: Arc<BackendClient>,
        transformer: Arc<DocumentTransformer>,
        cache: Arc<DocumentCache>,
    ) -> Self {
        Self {
            backend,
            transformer,
            cache,
            session: Arc::new(Mutex::new(ChatSession::new())),
            tool_router: Self::tool_router(),
        }
    }

    async fn open(&self, name: &str) -> Result<Document, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("name must not be empty".to_string()));
        }

        let markdown = self.backend.download(name).await?;
        let doc = self.cache.get_or_transform(&markdown, &self.transformer).await;
        info!(
            name,
            sections = doc.sections.len(),
            has_header = doc.header.is_some(),
            "analysis opened"
        );

        if self.session.lock().await.bind(name) {
            debug!(name, "chat session bound to analysis");
        }
        Ok(Document::clone(&doc))
    }

    async fn relay_chat(&self, message: Option<String>) -> Result<String, AppError> {
        let (request, bound) = {
            let mut session = self.session.lock().await;
            let message = match message {
                Some(text) => text,
                None => session.take_draft(),
            };
            let message = message.trim();
            if message.is_empty() {
                return Err(AppError::InvalidInput(
                    "message must not be empty".to_string(),
                ));
            }
            (session.request(message), session.file().map(str::to_string))
        };

        let reply = match self.backend.chat(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                let mut session = self.session.lock().await;
                // Only hand the text back to the same analysis, and never over a newer draft.
                if session.file() == bound.as_deref() && session.draft().is_empty() {
                    warn!(error = %e, "chat request failed, keeping message as draft");
                    session.set_draft(request.message);
                } else {
                    warn!(error = %e, "chat request failed");
                }
                return Err(e.into());
            }
        };

        let mut session = self.session.lock().await;
        if session.file() == bound.as_deref() {
            session.push_user(request.message);
            session.push_reply(reply.response.as_str());
        } else {
            debug!("analysis changed while chat was in flight, reply not recorded");
        }
        Ok(reply.response)
    }
}

#[tool_router]
impl ViewerServer {
    #[tool(description = "List uploaded files and analysis artifacts known to the EWA backend (GET /api/files).")]
    async fn list_analyses(&self) -> Result<Json<AnalysisListResponse>, String> {
        let files = self
            .backend
            .list_files()
            .await
            .map_err(|e| format!("list_analyses failed: {e}"))?;
        Ok(Json(AnalysisListResponse { files }))
    }

    #[tool(description = "Download an analysis report by name and return it as a structured document: header (title, period, overall risk), then sections of text, tables with cell hints, and key-finding cards. Opening a different analysis resets the chat session.")]
    async fn open_analysis(
        &self,
        Parameters(params): Parameters<OpenAnalysisParams>,
    ) -> Result<Json<Document>, String> {
        let doc = self
            .open(&params.name)
            .await
            .map_err(|e| format!("open_analysis failed: {e}"))?;
        Ok(Json(doc))
    }

    #[tool(description = "Transform report markdown supplied inline into a structured document, without contacting the backend.")]
    async fn render_markdown(
        &self,
        Parameters(params): Parameters<RenderMarkdownParams>,
    ) -> Result<Json<Document>, String> {
        let doc = self
            .cache
            .get_or_transform(&params.markdown, &self.transformer)
            .await;
        Ok(Json(Document::clone(&doc)))
    }

    #[tool(description = "Ask the backend a question about the open analysis (POST /api/chat). Without a message, the saved draft is sent. Returns the reply text and records both turns in the chat transcript.")]
    async fn send_chat(
        &self,
        Parameters(params): Parameters<SendChatParams>,
    ) -> Result<Json<ChatReplyResponse>, String> {
        let text = self
            .relay_chat(params.message)
            .await
            .map_err(|e| format!("send_chat failed: {e}"))?;
        Ok(Json(ChatReplyResponse { text }))
    }

    #[tool(description = "Save unsent chat input for the open analysis. It is cleared when another analysis is opened or the chat is reset.")]
    async fn save_draft(
        &self,
        Parameters(params): Parameters<SaveDraftParams>,
    ) -> Result<Json<OkResponse>, String> {
        self.session.lock().await.set_draft(params.text);
        Ok(Json(OkResponse { ok: true }))
    }

    #[tool(description = "Get the chat transcript, the analysis it belongs to, and the saved draft.")]
    async fn get_chat(&self) -> Result<Json<ChatTranscriptResponse>, String> {
        Ok(Json(self.session.lock().await.transcript()))
    }

    #[tool(description = "Clear the chat transcript and draft for the open analysis.")]
    async fn reset_chat(&self) -> Result<Json<OkResponse>, String> {
        self.session.lock().await.reset();
        Ok(Json(OkResponse { ok: true }))
    }
}

#[tool_handler]
impl ServerHandler for ViewerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ewa-viewer".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "EWA analysis viewer. Use list_analyses to find reports, then open_analysis to get \
the structured document. render_markdown transforms markdown you already have. Questions about \
the open analysis go through send_chat; get_chat returns the transcript and reset_chat clears it."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ewa_backend::backend::BackendClientConfig;
    use ewa_backend::testing::{MockBackend, MockResponse};
    use ewa_document::{RenderedBlock, SeverityTier};

    use super::*;

    const PRD: &str = "# EWA Analysis for PRD\nOverall Risk Assessment: `High`\n\n\
## Key Findings\nBackups failed twice.\n";
    const QAS: &str = "## Overview\nNothing to report.\n";

    fn server_for(base: &str) -> ViewerServer {
        let config = BackendClientConfig {
            max_retries: 0,
            ..BackendClientConfig::new(base)
        };
        let backend = BackendClient::new(config).expect("valid backend config");
        ViewerServer::new(
            Arc::new(backend),
            Arc::new(DocumentTransformer::default()),
            Arc::new(DocumentCache::new(4)),
        )
    }

    /// Server whose backend is never reached.
    fn offline_server() -> ViewerServer {
        server_for("http://127.0.0.1:9")
    }

    /// Backend serving both reports plus the given chat responses.
    async fn backend_with_chat(chat: Vec<MockResponse>) -> MockBackend {
        MockBackend::start(vec![
            (
                "GET /api/download/PRD.md",
                vec![MockResponse::text(200, "text/markdown", PRD)],
            ),
            (
                "GET /api/download/QAS.md",
                vec![MockResponse::text(200, "text/markdown", QAS)],
            ),
            ("POST /api/chat", chat),
        ])
        .await
        .expect("mock backend")
    }

    fn tool_error<T>(result: Result<Json<T>, String>) -> String {
        match result {
            Ok(_) => panic!("tool should fail"),
            Err(e) => e,
        }
    }

    async fn transcript(server: &ViewerServer) -> ChatTranscriptResponse {
        match server.get_chat().await {
            Ok(Json(transcript)) => transcript,
            Err(e) => panic!("get_chat failed: {e}"),
        }
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = ViewerServer::tool_router().list_all();
        for name in [
            "list_analyses",
            "open_analysis",
            "render_markdown",
            "send_chat",
            "save_draft",
            "get_chat",
            "reset_chat",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn render_markdown_returns_document() {
        let server = offline_server();
        let markdown = "# EWA Analysis for PRD\nOverall Risk Assessment: `High`\n\n\
## Key Findings\n| Area | Status |\n|---|---|\n| Backup | Critical |\n";
        let Json(doc) = server
            .render_markdown(Parameters(RenderMarkdownParams {
                markdown: markdown.to_string(),
            }))
            .await
            .unwrap();

        let header = doc.header.expect("header");
        assert_eq!(header.risk.as_deref(), Some("High"));
        assert_eq!(header.risk_state, SeverityTier::Error);
        assert_eq!(doc.sections.len(), 1);
        assert!(matches!(doc.sections[0].blocks[0], RenderedBlock::Table { .. }));
    }

    #[tokio::test]
    async fn draft_and_reset() {
        let server = offline_server();
        server
            .save_draft(Parameters(SaveDraftParams {
                text: "What about backups?".to_string(),
            }))
            .await
            .unwrap();

        let saved = transcript(&server).await;
        assert_eq!(saved.input_draft, "What about backups?");
        assert!(saved.messages.is_empty());

        server.reset_chat().await.unwrap();
        assert_eq!(transcript(&server).await.input_draft, "");
    }

    #[tokio::test]
    async fn empty_chat_message_is_rejected_locally() {
        let server = offline_server();
        let err = tool_error(
            server
                .send_chat(Parameters(SendChatParams {
                    message: Some("   ".to_string()),
                }))
                .await,
        );
        assert!(err.contains("message must not be empty"), "{err}");

        // No message and no draft.
        let err = tool_error(server.send_chat(Parameters(SendChatParams { message: None })).await);
        assert!(err.contains("message must not be empty"), "{err}");
    }

    #[tokio::test]
    async fn blank_analysis_name_is_rejected_locally() {
        let server = offline_server();
        let err = tool_error(
            server
                .open_analysis(Parameters(OpenAnalysisParams {
                    name: " ".to_string(),
                }))
                .await,
        );
        assert!(err.contains("name must not be empty"), "{err}");
    }

    #[tokio::test]
    async fn open_analysis_transforms_and_binds_chat() {
        let mock = backend_with_chat(vec![]).await;
        let server = server_for(&mock.base_url());

        let Json(doc) = server
            .open_analysis(Parameters(OpenAnalysisParams {
                name: "PRD.md".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(
            doc.header.and_then(|h| h.title).as_deref(),
            Some("EWA Analysis for PRD")
        );
        assert_eq!(doc.sections[0].title, "Key Findings");
        assert_eq!(transcript(&server).await.file.as_deref(), Some("PRD.md"));
    }

    #[tokio::test]
    async fn chat_records_both_turns() {
        let mock = backend_with_chat(vec![MockResponse::json(
            200,
            r#"{"response": "Two backup jobs failed."}"#,
        )])
        .await;
        let server = server_for(&mock.base_url());
        server.open("PRD.md").await.unwrap();

        let Json(reply) = server
            .send_chat(Parameters(SendChatParams {
                message: Some("  Why is the risk high? ".to_string()),
            }))
            .await
            .unwrap();
        assert_eq!(reply.text, "Two backup jobs failed.");

        let chat = transcript(&server).await;
        let turns: Vec<(&str, bool)> = chat
            .messages
            .iter()
            .map(|m| (m.text.as_str(), m.is_user))
            .collect();
        assert_eq!(
            turns,
            vec![
                ("Why is the risk high?", true),
                ("Two backup jobs failed.", false)
            ]
        );

        let requests = mock.requests();
        let sent = &requests.last().expect("chat request").body;
        assert!(sent.contains(r#""message":"Why is the risk high?""#), "{sent}");
        assert!(sent.contains(r#""fileName":"PRD.md""#), "{sent}");
    }

    #[tokio::test]
    async fn omitted_message_sends_saved_draft() {
        let mock = backend_with_chat(vec![MockResponse::json(200, r#"{"reply": "Yes."}"#)]).await;
        let server = server_for(&mock.base_url());
        server.open("PRD.md").await.unwrap();
        server
            .save_draft(Parameters(SaveDraftParams {
                text: "Are backups covered?".to_string(),
            }))
            .await
            .unwrap();

        let Json(reply) = server
            .send_chat(Parameters(SendChatParams { message: None }))
            .await
            .unwrap();
        assert_eq!(reply.text, "Yes.");

        let chat = transcript(&server).await;
        assert_eq!(chat.input_draft, "");
        assert_eq!(chat.messages[0].text, "Are backups covered?");
        let requests = mock.requests();
        let sent = &requests.last().expect("chat request").body;
        assert!(sent.contains(r#""message":"Are backups covered?""#), "{sent}");
    }

    #[tokio::test]
    async fn failed_chat_returns_text_to_draft() {
        let mock = backend_with_chat(vec![MockResponse::json(
            400,
            r#"{"error": "model unavailable"}"#,
        )])
        .await;
        let server = server_for(&mock.base_url());
        server.open("PRD.md").await.unwrap();

        let err = tool_error(
            server
                .send_chat(Parameters(SendChatParams {
                    message: Some("Why?".to_string()),
                }))
                .await,
        );
        assert!(err.contains("model unavailable"), "{err}");

        let chat = transcript(&server).await;
        assert_eq!(chat.input_draft, "Why?");
        assert!(chat.messages.is_empty());
    }

    fn spawn_chat(
        server: &ViewerServer,
        text: &str,
    ) -> tokio::task::JoinHandle<Result<String, AppError>> {
        let server = server.clone();
        let text = text.to_string();
        tokio::spawn(async move { server.relay_chat(Some(text)).await })
    }

    #[tokio::test]
    async fn failed_chat_is_not_restored_into_another_analysis() {
        let mock = backend_with_chat(vec![MockResponse::json(400, r#"{"error": "bad"}"#)
            .delayed(Duration::from_millis(300))])
        .await;
        let server = server_for(&mock.base_url());
        server.open("PRD.md").await.unwrap();

        let chatting = spawn_chat(&server, "question about PRD");
        assert!(mock.wait_for_hits("POST /api/chat", 1).await);
        server.open("QAS.md").await.unwrap();

        assert!(chatting.await.unwrap().is_err());
        let chat = transcript(&server).await;
        assert_eq!(chat.file.as_deref(), Some("QAS.md"));
        assert_eq!(chat.input_draft, "");
        assert!(chat.messages.is_empty());
    }

    #[tokio::test]
    async fn failed_chat_keeps_newer_draft() {
        let mock = backend_with_chat(vec![MockResponse::json(400, r#"{"error": "bad"}"#)
            .delayed(Duration::from_millis(300))])
        .await;
        let server = server_for(&mock.base_url());
        server.open("PRD.md").await.unwrap();

        let chatting = spawn_chat(&server, "first question");
        assert!(mock.wait_for_hits("POST /api/chat", 1).await);
        server
            .save_draft(Parameters(SaveDraftParams {
                text: "second question".to_string(),
            }))
            .await
            .unwrap();

        assert!(chatting.await.unwrap().is_err());
        assert_eq!(transcript(&server).await.input_draft, "second question");
    }

    #[tokio::test]
    async fn reply_after_switching_analysis_is_not_recorded() {
        let mock = backend_with_chat(vec![MockResponse::json(200, r#"{"response": "late"}"#)
            .delayed(Duration::from_millis(300))])
        .await;
        let server = server_for(&mock.base_url());
        server.open("PRD.md").await.unwrap();

        let chatting = spawn_chat(&server, "question about PRD");
        assert!(mock.wait_for_hits("POST /api/chat", 1).await);
        server.open("QAS.md").await.unwrap();

        assert_eq!(chatting.await.unwrap().unwrap(), "late");
        let chat = transcript(&server).await;
        assert_eq!(chat.file.as_deref(), Some("QAS.md"));
        assert!(chat.messages.is_empty());
    }
}
