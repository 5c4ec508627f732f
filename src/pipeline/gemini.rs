//! Gemini REST implementation of [`InferenceService`].
//!
//! Three endpoints are used:
//!
//! * **Upload** uses the resumable protocol. A `start` request announcing size
//!   and type returns a session URL in `x-goog-upload-url`, then one
//!   `upload, finalize` request sends the bytes and returns the file.
//! * **Status**: `GET v1beta/{name}` returns the file with its `state`.
//! * **Generate**: `POST v1beta/models/{model}:generateContent` with a
//!   `fileData` part referencing the upload and a text part with the prompt.
//!
//! The credential travels in the `x-goog-api-key` header, never in a URL.

use crate::config::{ApiKey, SummaryConfig};
use crate::error::SummaryError;
use crate::pipeline::remote::{FileState, InferenceService, ReadyFile, RemoteFile};
use crate::prompts::Prompt;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// HTTP client for the Gemini File and GenerateContent APIs.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client from `config`. Fails with
    /// [`SummaryError::MissingCredential`] when no key is configured.
    pub fn new(config: &SummaryConfig) -> Result<Self, SummaryError> {
        let api_key = config.require_api_key()?.clone();
        let http = Client::builder()
            .user_agent(concat!("unishare-summarizer/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SummaryError::Unexpected(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.trim_start_matches("models/").to_string(),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, self.api_key.expose())
    }

    fn upload_endpoint(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url)
    }

    fn file_endpoint(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, name.trim_start_matches('/'))
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Request body for `generateContent`.
    fn generate_body(&self, file: &ReadyFile, prompt: &Prompt) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "fileData": { "mimeType": file.mime_type(), "fileUri": file.uri() } },
                    { "text": prompt.as_str() }
                ]
            }]
        });
        let mut generation = serde_json::Map::new();
        if let Some(t) = self.temperature {
            generation.insert("temperature".into(), json!(t));
        }
        if let Some(n) = self.max_output_tokens {
            generation.insert("maxOutputTokens".into(), json!(n));
        }
        if !generation.is_empty() {
            body["generationConfig"] = Value::Object(generation);
        }
        body
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Map Gemini's state enum onto [`FileState`].
///
/// `STATE_UNSPECIFIED` and anything unknown count as still processing.
pub fn parse_state(raw: Option<&str>) -> FileState {
    match raw {
        Some("ACTIVE") => FileState::Ready,
        Some("FAILED") => FileState::Failed,
        _ => FileState::Processing,
    }
}

impl From<FileResource> for RemoteFile {
    fn from(f: FileResource) -> Self {
        RemoteFile {
            state: parse_state(f.state.as_deref()),
            error: f.error.map(|e| e.message).filter(|m| !m.is_empty()),
            name: f.name,
            uri: f.uri,
            mime_type: f.mime_type,
        }
    }
}

impl GenerateResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, String> {
        let block = self.prompt_feedback.and_then(|p| p.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(match block {
                Some(reason) => format!("prompt blocked: {reason}"),
                None => "response contained no candidates".to_string(),
            });
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(format!("empty response (finish reason: {reason})"));
        }
        Ok(text)
    }
}

/// Turn a non-success response into a readable message.
async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) if !env.error.message.is_empty() => format!("HTTP {status}: {}", env.error.message),
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => format!("HTTP {status}: {}", body.trim()),
    }
}

fn transport_error(context: &str, e: reqwest::Error) -> String {
    if e.is_timeout() {
        format!("{context}: request timed out")
    } else {
        format!("{context}: {e}")
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, SummaryError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SummaryError::StageFailed {
                filename: display_name.to_string(),
                source,
            })?;

        // ── Start the resumable session ──────────────────────────────────────
        let mut start = self
            .authed(self.http.post(self.upload_endpoint()))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string());
        if !mime_type.is_empty() {
            start = start.header("X-Goog-Upload-Header-Content-Type", mime_type);
        }
        let response = start
            .json(&json!({ "file": { "displayName": display_name } }))
            .send()
            .await
            .map_err(|e| SummaryError::TransferFailed(transport_error("upload start", e)))?;

        if !response.status().is_success() {
            return Err(SummaryError::TransferFailed(format!(
                "upload start: {}",
                describe_failure(response).await
            )));
        }

        let session_url = response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                SummaryError::TransferFailed("upload start: no upload URL in response".into())
            })?;
        debug!("Upload session opened for {} ({} bytes)", display_name, bytes.len());

        // ── Send the bytes and finalize ──────────────────────────────────────
        let response = self
            .authed(self.http.post(&session_url))
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| SummaryError::TransferFailed(transport_error("upload", e)))?;

        if !response.status().is_success() {
            return Err(SummaryError::TransferFailed(format!(
                "upload: {}",
                describe_failure(response).await
            )));
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            SummaryError::TransferFailed(format!("upload: malformed response: {e}"))
        })?;
        Ok(uploaded.file.into())
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, SummaryError> {
        let response = self
            .authed(self.http.get(self.file_endpoint(name)))
            .send()
            .await
            .map_err(|e| SummaryError::TransferFailed(transport_error("status check", e)))?;

        if !response.status().is_success() {
            return Err(SummaryError::TransferFailed(format!(
                "status check for {name}: {}",
                describe_failure(response).await
            )));
        }

        let file: FileResource = response.json().await.map_err(|e| {
            SummaryError::TransferFailed(format!("status check: malformed response: {e}"))
        })?;
        Ok(file.into())
    }

    async fn generate(&self, file: &ReadyFile, prompt: &Prompt) -> Result<String, SummaryError> {
        let response = self
            .authed(self.http.post(self.generate_endpoint()))
            .json(&self.generate_body(file, prompt))
            .send()
            .await
            .map_err(|e| SummaryError::GenerationFailed(transport_error("generate", e)))?;

        if !response.status().is_success() {
            return Err(SummaryError::GenerationFailed(
                describe_failure(response).await,
            ));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SummaryError::GenerationFailed(format!("malformed response: {e}")))?;
        body.into_text().map_err(SummaryError::GenerationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    fn client_for(server: &MockServer) -> GeminiClient {
        let config = SummaryConfig::builder()
            .api_key("test-key")
            .base_url(server.base_url())
            .request_timeout_secs(5)
            .build()
            .expect("config");
        GeminiClient::new(&config).expect("client")
    }

    fn ready(uri: &str) -> ReadyFile {
        ReadyFile::try_from_handle(RemoteFile {
            name: "files/abc".into(),
            uri: uri.into(),
            mime_type: "application/pdf".into(),
            state: FileState::Ready,
            error: None,
        })
        .expect("ready")
    }

    #[test]
    fn new_requires_credential() {
        let err = GeminiClient::new(&SummaryConfig::default()).unwrap_err();
        assert!(matches!(err, SummaryError::MissingCredential));
    }

    #[test]
    fn state_mapping() {
        assert_eq!(parse_state(Some("ACTIVE")), FileState::Ready);
        assert_eq!(parse_state(Some("FAILED")), FileState::Failed);
        assert_eq!(parse_state(Some("PROCESSING")), FileState::Processing);
        assert_eq!(parse_state(Some("STATE_UNSPECIFIED")), FileState::Processing);
        assert_eq!(parse_state(None), FileState::Processing);
    }

    #[test]
    fn model_prefix_is_stripped() {
        let config = SummaryConfig::builder()
            .api_key("k")
            .model("models/gemini-1.5-pro")
            .build()
            .unwrap();
        let client = GeminiClient::new(&config).unwrap();
        assert!(client
            .generate_endpoint()
            .ends_with("/v1beta/models/gemini-1.5-pro:generateContent"));
    }

    #[test]
    fn generation_config_only_when_set() {
        let config = SummaryConfig::builder().api_key("k").build().unwrap();
        let client = GeminiClient::new(&config).unwrap();
        let prompt = crate::prompts::compose(&Default::default());
        let body = client.generate_body(&ready("https://x/files/abc"), &prompt);
        assert!(body.get("generationConfig").is_none());
        assert_eq!(
            body["contents"][0]["parts"][0]["fileData"]["fileUri"],
            "https://x/files/abc"
        );

        let config = SummaryConfig::builder()
            .api_key("k")
            .temperature(0.2)
            .max_output_tokens(2048)
            .build()
            .unwrap();
        let client = GeminiClient::new(&config).unwrap();
        let body = client.generate_body(&ready("https://x/files/abc"), &prompt);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[tokio::test]
    async fn upload_uses_resumable_protocol() {
        let server = MockServer::start_async().await;
        let session_url = server.url("/upload-session/1");

        let start = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload/v1beta/files")
                    .header("x-goog-api-key", "test-key")
                    .header("x-goog-upload-protocol", "resumable")
                    .header("x-goog-upload-command", "start")
                    .header("x-goog-upload-header-content-length", "9")
                    .header("x-goog-upload-header-content-type", "application/pdf");
                then.status(200).header("x-goog-upload-url", session_url.as_str());
            })
            .await;

        let finalize = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload-session/1")
                    .header("x-goog-upload-command", "upload, finalize")
                    .header("x-goog-upload-offset", "0")
                    .body("%PDF-test");
                then.status(200).json_body(json!({
                    "file": {
                        "name": "files/abc",
                        "uri": "https://example.test/v1beta/files/abc",
                        "mimeType": "application/pdf",
                        "state": "ACTIVE"
                    }
                }));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-test").unwrap();

        let client = client_for(&server);
        let file = client
            .upload_file(&path, "application/pdf", "notes.pdf")
            .await
            .expect("upload");

        start.assert_async().await;
        finalize.assert_async().await;
        assert_eq!(file.name, "files/abc");
        assert_eq!(file.state, FileState::Ready);
        assert_eq!(file.mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn upload_start_error_is_transfer_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/upload/v1beta/files");
                then.status(403).json_body(json!({
                    "error": { "code": 403, "message": "API key not valid" }
                }));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"png").unwrap();

        let err = client_for(&server)
            .upload_file(&path, "image/jpeg", "a.png")
            .await
            .unwrap_err();
        match err {
            SummaryError::TransferFailed(msg) => {
                assert!(msg.contains("403"), "got: {msg}");
                assert!(msg.contains("API key not valid"), "got: {msg}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_file_parses_processing_and_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1beta/files/vid");
                then.status(200).json_body(json!({
                    "name": "files/vid",
                    "uri": "https://example.test/v1beta/files/vid",
                    "mimeType": "video/mp4",
                    "state": "PROCESSING"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1beta/files/bad");
                then.status(200).json_body(json!({
                    "name": "files/bad",
                    "mimeType": "video/mp4",
                    "state": "FAILED",
                    "error": { "code": 3, "message": "could not decode video" }
                }));
            })
            .await;

        let client = client_for(&server);
        let vid = client.get_file("files/vid").await.unwrap();
        assert_eq!(vid.state, FileState::Processing);

        let bad = client.get_file("files/bad").await.unwrap();
        assert_eq!(bad.state, FileState::Failed);
        assert_eq!(bad.error.as_deref(), Some("could not decode video"));
    }

    #[tokio::test]
    async fn generate_joins_text_parts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent")
                    .header("x-goog-api-key", "test-key")
                    .body_contains("\"fileUri\":\"https://example.test/v1beta/files/abc\"");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": { "parts": [
                            { "text": "### 1. Overview" },
                            { "text": "\n- point" }
                        ]},
                        "finishReason": "STOP"
                    }]
                }));
            })
            .await;

        let prompt = crate::prompts::compose(&Default::default());
        let text = client_for(&server)
            .generate(&ready("https://example.test/v1beta/files/abc"), &prompt)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(text, "### 1. Overview\n- point");
    }

    #[tokio::test]
    async fn generate_quota_error_is_generation_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent");
                then.status(429).json_body(json!({
                    "error": { "code": 429, "message": "Resource has been exhausted" }
                }));
            })
            .await;

        let prompt = crate::prompts::compose(&Default::default());
        let err = client_for(&server)
            .generate(&ready("https://example.test/v1beta/files/abc"), &prompt)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::GenerationFailure);
        assert!(err.to_string().contains("Resource has been exhausted"));
    }

    #[tokio::test]
    async fn blocked_prompt_is_generation_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent");
                then.status(200).json_body(json!({
                    "promptFeedback": { "blockReason": "SAFETY" }
                }));
            })
            .await;

        let prompt = crate::prompts::compose(&Default::default());
        let err = client_for(&server)
            .generate(&ready("https://example.test/v1beta/files/abc"), &prompt)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SAFETY"), "got: {err}");
    }
}
