//! Gemini REST client.
//!
//! Implements [`InferenceEndpoint`] against the Generative Language API:
//! `GET /v1beta/models/{model}` to probe, the raw upload protocol for media,
//! and `:generateContent` for replies.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use jarvis_core::config::ModelConfig;
use jarvis_core::secrets::Credential;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::gateway::{Content, InferenceEndpoint, MediaRef};

const API_KEY_HEADER: &str = "x-goog-api-key";
const KEY_REJECTED_REASON: &str = "API_KEY_INVALID";
const FILE_POLL_ATTEMPTS: u32 = 10;
const FILE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Credential,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Credential) -> Self {
        let defaults = ModelConfig::default();
        Self {
            api_key,
            base_url: defaults.base_url,
            timeout: Duration::from_secs(defaults.request_timeout_secs),
        }
    }

    pub fn from_model_config(api_key: Credential, config: &ModelConfig) -> Self {
        Self {
            api_key,
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Credential,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Poll the file until it leaves `PROCESSING`, checking at most
    /// `FILE_POLL_ATTEMPTS` times after the upload.
    async fn wait_until_active(
        &self,
        mut file: FileResource,
    ) -> Result<FileResource, GatewayError> {
        let mut checks = 0;
        loop {
            match file.state.as_deref() {
                None | Some("ACTIVE") => return Ok(file),
                Some("FAILED") => {
                    return Err(GatewayError::Media(format!(
                        "upload {} failed processing",
                        file.name
                    )))
                }
                Some(_) if checks == FILE_POLL_ATTEMPTS => {
                    return Err(GatewayError::Media(format!(
                        "upload {} still processing after {} checks",
                        file.name, FILE_POLL_ATTEMPTS
                    )))
                }
                Some(_) => {
                    tokio::time::sleep(FILE_POLL_INTERVAL).await;
                    checks += 1;
                    let response = self
                        .http
                        .get(self.url(&format!("/v1beta/{}", file.name)))
                        .header(API_KEY_HEADER, self.api_key.expose())
                        .send()
                        .await
                        .map_err(map_transport_error)?;
                    file = parse_json(check_status(response).await?).await?;
                }
            }
        }
    }
}

#[async_trait]
impl InferenceEndpoint for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn probe_model(&self, model: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .get(self.url(&format!("/v1beta/models/{}", model)))
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<MediaRef, GatewayError> {
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Uploading media");
        let response = self
            .http
            .post(self.url("/upload/v1beta/files"))
            .header(API_KEY_HEADER, self.api_key.expose())
            .header("X-Goog-Upload-Protocol", "raw")
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(map_transport_error)?;
        let uploaded: UploadResponse = parse_json(check_status(response).await?).await?;
        let file = self.wait_until_active(uploaded.file).await?;
        Ok(MediaRef {
            mime_type: file.mime_type.unwrap_or_else(|| mime_type.to_string()),
            name: file.name,
            uri: file.uri,
        })
    }

    async fn generate(&self, model: &str, contents: &[Content]) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(self.url(&format!("/v1beta/models/{}:generateContent", model)))
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&GenerateRequest { contents })
            .send()
            .await
            .map_err(map_transport_error)?;
        let body: GenerateResponse = parse_json(check_status(response).await?).await?;
        body.into_text()
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .finish()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, GatewayError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GatewayError::Blocked(reason));
        }
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(GatewayError::MalformedResponse("no candidates".to_string()));
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        if !text.is_empty() {
            return Ok(text);
        }
        match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION")) => {
                Err(GatewayError::Blocked(reason.to_string()))
            }
            Some(reason) => Err(GatewayError::MalformedResponse(format!(
                "candidate has no text (finish reason {})",
                reason
            ))),
            None => Err(GatewayError::MalformedResponse(
                "candidate has no text".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    uri: String,
    mime_type: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// Error mapping
// =============================================================================

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(err.to_string())
    } else {
        GatewayError::Network(err.to_string())
    }
}

/// Pass successful responses through; map error statuses to [`GatewayError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    // Gemini reports a rejected key as 400 INVALID_ARGUMENT
    let key_rejected = body.contains(KEY_REJECTED_REASON);
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });
    if key_rejected {
        return Err(GatewayError::Auth(message));
    }
    Err(status_error(status.as_u16(), message))
}

fn status_error(status: u16, message: String) -> GatewayError {
    match status {
        400 => GatewayError::InvalidRequest(message),
        401 | 403 => GatewayError::Auth(message),
        404 => GatewayError::ModelNotFound(message),
        408 => GatewayError::Timeout(message),
        429 => GatewayError::Quota(message),
        _ => GatewayError::Api { status, message },
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let body = response.text().await.map_err(map_transport_error)?;
    serde_json::from_str(&body).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
}
