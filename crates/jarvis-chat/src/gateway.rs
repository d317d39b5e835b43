//! Inference gateway.
//!
//! Picks a usable model from the configured preference list and runs one
//! conversational exchange against it. The remote service sits behind the
//! [`InferenceEndpoint`] trait so the gateway can be driven by a scripted
//! endpoint in tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use jarvis_core::config::ModelCandidate;
use jarvis_core::types::{MediaBlob, Role, Turn};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::media::ScopedMediaFile;

// =============================================================================
// Wire content
// =============================================================================

/// Role name understood by the endpoint.
pub fn gateway_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Reference to media already uploaded to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

/// One piece of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn media(media: &MediaRef) -> Self {
        Part::File {
            file_data: FileData {
                mime_type: media.mime_type.clone(),
                file_uri: media.uri.clone(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::File { .. } => None,
        }
    }
}

/// A role-tagged message as sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role: gateway_role(role).to_string(),
            parts,
        }
    }

    pub fn from_turn(turn: &Turn) -> Self {
        Self::new(turn.role(), vec![Part::text(turn.content())])
    }
}

// =============================================================================
// InferenceEndpoint trait
// =============================================================================

/// Remote generative-model service.
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Check that `model` exists and is usable with the current credential.
    async fn probe_model(&self, model: &str) -> Result<(), GatewayError>;

    /// Upload a local file and return a reference usable in a request.
    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<MediaRef, GatewayError>;

    /// Generate a reply to `contents` and return its text.
    async fn generate(&self, model: &str, contents: &[Content]) -> Result<String, GatewayError>;
}

// =============================================================================
// Model selection
// =============================================================================

/// A model that passed its probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pub id: String,
    pub label: String,
}

impl ModelHandle {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl From<&ModelCandidate> for ModelHandle {
    fn from(candidate: &ModelCandidate) -> Self {
        Self::new(candidate.id.clone(), candidate.label.clone())
    }
}

impl std::fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

// =============================================================================
// ChatSession
// =============================================================================

/// A multi-turn exchange seeded with prior history.
pub struct ChatSession<'a> {
    endpoint: &'a dyn InferenceEndpoint,
    model: String,
    contents: Vec<Content>,
}

impl<'a> ChatSession<'a> {
    pub fn start(endpoint: &'a dyn InferenceEndpoint, model: &str, history: &[Turn]) -> Self {
        Self {
            endpoint,
            model: model.to_string(),
            contents: history.iter().map(Content::from_turn).collect(),
        }
    }

    /// Send one user message. The reply is recorded only on success.
    pub async fn send(&mut self, text: &str) -> Result<String, GatewayError> {
        self.contents.push(Content::new(Role::User, vec![Part::text(text)]));
        match self.endpoint.generate(&self.model, &self.contents).await {
            Ok(reply) => {
                self.contents.push(Content::new(Role::Assistant, vec![Part::text(reply.as_str())]));
                Ok(reply)
            }
            Err(e) => {
                self.contents.pop();
                Err(e)
            }
        }
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }
}

// =============================================================================
// InferenceGateway
// =============================================================================

/// What the user submitted for one turn.
#[derive(Debug, Clone, Copy)]
pub enum UserInput<'a> {
    Text(&'a str),
    Voice(&'a MediaBlob),
}

/// Model selection plus one-shot conversation against an endpoint.
pub struct InferenceGateway {
    endpoint: Arc<dyn InferenceEndpoint>,
    candidates: Vec<ModelCandidate>,
    voice_instruction: String,
}

impl InferenceGateway {
    pub fn new(
        endpoint: Arc<dyn InferenceEndpoint>,
        candidates: Vec<ModelCandidate>,
        voice_instruction: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            candidates,
            voice_instruction: voice_instruction.into(),
        }
    }

    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    /// Probe candidates in order and return the first usable one.
    ///
    /// An authentication failure ends the search immediately, since every
    /// later candidate would fail the same way.
    pub async fn resolve_model(&self) -> Result<ModelHandle, GatewayError> {
        let mut tried = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            match self.endpoint.probe_model(&candidate.id).await {
                Ok(()) => {
                    tracing::info!(
                        model = %candidate.id,
                        label = %candidate.label,
                        endpoint = self.endpoint.name(),
                        "Model selected"
                    );
                    return Ok(ModelHandle::from(candidate));
                }
                Err(e @ GatewayError::Auth(_)) => {
                    tracing::error!(model = %candidate.id, error = %e, "Credential rejected");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        model = %candidate.id,
                        error = %e,
                        "Model unavailable, trying next"
                    );
                    tried.push(candidate.id.clone());
                }
            }
        }
        Err(GatewayError::NoModelAvailable { tried })
    }

    /// Run one exchange and return the raw reply text.
    ///
    /// `history` holds the turns before the current one; it is forwarded for
    /// text input and ignored for voice input, which is sent standalone.
    pub async fn converse(
        &self,
        model: &ModelHandle,
        input: &UserInput<'_>,
        history: &[Turn],
        directive: &str,
    ) -> Result<String, GatewayError> {
        match input {
            UserInput::Text(text) => {
                tracing::debug!(model = %model.id, history = history.len(), "Sending text turn");
                let mut chat = ChatSession::start(self.endpoint.as_ref(), &model.id, history);
                chat.send(&format!("{} {}", directive, text)).await
            }
            UserInput::Voice(blob) => {
                tracing::debug!(model = %model.id, bytes = blob.len(), "Sending voice turn");
                let staged = ScopedMediaFile::stage(blob)?;
                let result = self.send_media(model, &staged, directive).await;
                staged.close();
                result
            }
        }
    }

    async fn send_media(
        &self,
        model: &ModelHandle,
        staged: &ScopedMediaFile,
        directive: &str,
    ) -> Result<String, GatewayError> {
        let media = self
            .endpoint
            .upload_media(staged.path(), staged.mime_type())
            .await?;
        let contents = [Content::new(
            Role::User,
            vec![
                Part::text(directive),
                Part::text(self.voice_instruction.as_str()),
                Part::media(&media),
            ],
        )];
        self.endpoint.generate(&model.id, &contents).await
    }
}

impl std::fmt::Debug for InferenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceGateway")
            .field("endpoint", &self.endpoint.name())
            .field("candidates", &self.candidates)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
