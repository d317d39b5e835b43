//! Conversational engine for Jarvis.
//!
//! Owns the session transcript, selects a Gemini model, runs text and voice
//! turns through the inference gateway, and decodes open-app directives in
//! the replies.

pub mod error;
pub mod gateway;
pub mod gemini;
pub mod media;
pub mod orchestrator;
pub mod store;
pub mod testing;

pub use error::{ChatError, GatewayError, GatewayErrorKind, ERROR_MARKER};
pub use gateway::{
    gateway_role, ChatSession, Content, InferenceEndpoint, InferenceGateway, MediaRef,
    ModelHandle, Part, UserInput,
};
pub use gemini::{GeminiClient, GeminiConfig};
pub use media::{AudioCapture, ScopedMediaFile};
pub use orchestrator::{ChatOrchestrator, TurnOutcome};
pub use store::{ConversationStore, Session};
