//! Chat orchestrator: runs one user turn end to end.
//!
//! Appends the user turn, resolves (or reuses) the session's model, calls the
//! gateway, decodes any directive tag in the reply, and appends the assistant
//! turn. Navigation is left to the caller.

use std::sync::Arc;

use jarvis_action::{ActionRegistry, CommandInterpreter, DirectiveAction};
use jarvis_core::config::{AssistantConfig, JarvisConfig};
use jarvis_core::secrets::SecretsProvider;
use jarvis_core::types::Turn;

use crate::error::{ChatError, GatewayError, GatewayErrorKind};
use crate::gateway::{InferenceEndpoint, InferenceGateway, ModelHandle, UserInput};
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::media::AudioCapture;
use crate::store::Session;

/// Result of one submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant answered; its turn has been appended.
    Reply {
        display_text: String,
        action: Option<DirectiveAction>,
        /// Directive names stripped but not executed.
        ignored: Vec<String>,
        model: ModelHandle,
    },
    /// The exchange failed; no assistant turn was appended.
    Failed(GatewayError),
    /// No credential is configured; the gateway was not called.
    Skipped,
}

impl TurnOutcome {
    /// Text to show for this outcome, if any.
    pub fn display_text(&self) -> Option<String> {
        match self {
            TurnOutcome::Reply { display_text, .. } => Some(display_text.clone()),
            TurnOutcome::Failed(err) => Some(err.degraded_reply()),
            TurnOutcome::Skipped => None,
        }
    }
}

/// Central coordinator for a conversation.
pub struct ChatOrchestrator {
    gateway: Option<InferenceGateway>,
    interpreter: CommandInterpreter,
    assistant: AssistantConfig,
    directive: String,
}

impl ChatOrchestrator {
    /// Build an orchestrator. `gateway` is `None` when no credential is available.
    pub fn new(
        gateway: Option<InferenceGateway>,
        registry: ActionRegistry,
        assistant: AssistantConfig,
    ) -> Self {
        let directive = assistant.render_directive(&registry.names());
        Self {
            gateway,
            interpreter: CommandInterpreter::new(registry),
            assistant,
            directive,
        }
    }

    /// Wire the Gemini endpoint from configuration and the secrets provider.
    pub fn from_config(
        config: &JarvisConfig,
        secrets: &SecretsProvider,
    ) -> Result<Self, ChatError> {
        let registry = ActionRegistry::from_config(&config.actions)?;
        let gateway = match secrets.credential() {
            Some(key) => {
                let client =
                    GeminiClient::new(GeminiConfig::from_model_config(key, &config.model))?;
                Some(Self::gateway_for(Arc::new(client), config))
            }
            None => {
                tracing::warn!(key = secrets.key(), "No API key configured; replies are disabled");
                None
            }
        };
        Ok(Self::new(gateway, registry, config.assistant.clone()))
    }

    /// Gateway over any endpoint, using the configured candidates and voice instruction.
    pub fn gateway_for(
        endpoint: Arc<dyn InferenceEndpoint>,
        config: &JarvisConfig,
    ) -> InferenceGateway {
        InferenceGateway::new(
            endpoint,
            config.model.candidates.clone(),
            config.assistant.voice_instruction.clone(),
        )
    }

    pub fn has_credential(&self) -> bool {
        self.gateway.is_some()
    }

    /// The full directive sent with every request.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn interpreter(&self) -> &CommandInterpreter {
        &self.interpreter
    }

    /// Return the session's model, probing candidates if none is cached.
    ///
    /// `Ok(None)` means no credential is configured.
    pub async fn ensure_model(
        &self,
        session: &mut Session,
    ) -> Result<Option<ModelHandle>, GatewayError> {
        let Some(gateway) = &self.gateway else {
            return Ok(None);
        };
        if let Some(model) = session.model() {
            return Ok(Some(model.clone()));
        }
        let model = gateway.resolve_model().await?;
        session.set_model(model.clone());
        Ok(Some(model))
    }

    /// Submit a typed message.
    pub async fn submit_text(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<TurnOutcome, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.assistant.max_message_chars {
            return Err(ChatError::MessageTooLong(self.assistant.max_message_chars));
        }
        Ok(self.run_turn(session, Turn::user(text)).await)
    }

    /// Submit a voice recording. The transcript records the placeholder text.
    pub async fn submit_voice(
        &self,
        session: &mut Session,
        capture: AudioCapture,
    ) -> Result<TurnOutcome, ChatError> {
        if capture.is_empty() {
            return Err(ChatError::VoiceError("recording is empty".to_string()));
        }
        let turn = Turn::user_with_media(
            self.assistant.voice_placeholder.as_str(),
            capture.into_media(),
        );
        Ok(self.run_turn(session, turn).await)
    }

    async fn run_turn(&self, session: &mut Session, user_turn: Turn) -> TurnOutcome {
        let prior = session.history().len();
        session.append(user_turn);

        let model = match self.ensure_model(session).await {
            Ok(Some(model)) => model,
            Ok(None) => {
                tracing::warn!(session = %session.id(), "Turn skipped: no API key");
                return TurnOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!(session = %session.id(), error = %e, "Model resolution failed");
                return TurnOutcome::Failed(e);
            }
        };
        let Some(gateway) = &self.gateway else {
            return TurnOutcome::Skipped;
        };

        let result = {
            let (history, current) = session.history().split_at(prior);
            let Some(turn) = current.first() else {
                return TurnOutcome::Skipped;
            };
            let input = match turn.media() {
                Some(blob) => UserInput::Voice(blob),
                None => UserInput::Text(turn.content()),
            };
            gateway.converse(&model, &input, history, &self.directive).await
        };

        match result {
            Ok(raw) => {
                let interpretation = self.interpreter.interpret(&raw);
                session.append(Turn::assistant(interpretation.display_text.as_str()));
                tracing::info!(
                    session = %session.id(),
                    model = %model.id,
                    action = ?interpretation.action.as_ref().map(|a| a.to_string()),
                    "Turn completed"
                );
                TurnOutcome::Reply {
                    display_text: interpretation.display_text,
                    action: interpretation.action,
                    ignored: interpretation.ignored,
                    model,
                }
            }
            Err(e) => {
                if e.kind() == GatewayErrorKind::ModelNotFound {
                    session.invalidate_model();
                }
                tracing::error!(
                    session = %session.id(),
                    model = %model.id,
                    error = %e,
                    "Turn failed"
                );
                TurnOutcome::Failed(e)
            }
        }
    }
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("gateway", &self.gateway)
            .field("actions", &self.interpreter.registry().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEndpoint;
    use jarvis_core::types::Role;

    fn orchestrator(endpoint: Arc<ScriptedEndpoint>) -> ChatOrchestrator {
        let config = JarvisConfig::default();
        let gateway = ChatOrchestrator::gateway_for(endpoint, &config);
        ChatOrchestrator::new(Some(gateway), ActionRegistry::with_defaults(), config.assistant)
    }

    fn offline() -> ChatOrchestrator {
        ChatOrchestrator::new(None, ActionRegistry::with_defaults(), AssistantConfig::default())
    }

    #[test]
    fn test_directive_lists_registered_actions() {
        let orch = offline();
        assert!(orch.directive().starts_with("You are JARVIS."));
        assert!(orch.directive().contains("[[OPEN:<app>]]"));
        assert!(orch.directive().contains("youtube"));
        assert!(orch.directive().contains("whatsapp"));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let mut session = Session::new();
        let err = offline().submit_text(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_message_too_long_rejected() {
        let mut session = Session::new();
        let long = "a".repeat(4001);
        let err = offline().submit_text(&mut session, &long).await.unwrap_err();
        assert!(matches!(err, ChatError::MessageTooLong(4000)));
    }

    #[tokio::test]
    async fn test_skipped_without_credential() {
        let mut session = Session::new();
        let outcome = offline().submit_text(&mut session, "hello").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Skipped);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role(), Role::User);
        assert!(outcome.display_text().is_none());
    }

    #[tokio::test]
    async fn test_reply_with_directive() {
        let endpoint = Arc::new(ScriptedEndpoint::new());
        endpoint.push_reply("Sure. [[OPEN:youtube]] Opening now.");
        let orch = orchestrator(endpoint);
        let mut session = Session::new();

        let outcome = orch.submit_text(&mut session, "open youtube").await.unwrap();
        match &outcome {
            TurnOutcome::Reply {
                display_text,
                action,
                ignored,
                model,
            } => {
                assert_eq!(display_text, "Sure.  Opening now.");
                assert_eq!(action.as_ref().and_then(|a| a.target_uri()), Some("vnd.youtube://"));
                assert!(ignored.is_empty());
                assert_eq!(model.id, "gemini-2.5-flash");
            }
            other => panic!("expected reply, got {:?}", other),
        }
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].content(), "Sure.  Opening now.");
    }

    #[tokio::test]
    async fn test_failure_appends_no_assistant_turn() {
        let endpoint = Arc::new(ScriptedEndpoint::new());
        endpoint.push_error(GatewayError::Quota("exhausted".to_string()));
        let orch = orchestrator(endpoint);
        let mut session = Session::new();

        let outcome = orch.submit_text(&mut session, "hi").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Failed(GatewayError::Quota(_))));
        assert_eq!(session.history().len(), 1);
        assert_eq!(
            outcome.display_text().unwrap(),
            "Error: quota exceeded: exhausted"
        );
    }

    #[tokio::test]
    async fn test_voice_turn_records_placeholder() {
        let endpoint = Arc::new(ScriptedEndpoint::new());
        endpoint.push_reply("Playing now. [[OPEN:spotify]]");
        let orch = orchestrator(endpoint.clone());
        let mut session = Session::new();
        let capture =
            AudioCapture::from_wav_bytes(b"RIFF\x00\x00\x00\x00WAVEdata".to_vec()).unwrap();

        let outcome = orch.submit_voice(&mut session, capture).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Reply { .. }));
        assert_eq!(session.history()[0].content(), "🎤 [Voice Command]");
        assert!(session.history()[0].media().is_some());
        assert_eq!(endpoint.uploaded_paths().len(), 1);
    }
}
