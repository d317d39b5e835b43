//! Error types for the conversational interface.

use std::fmt;

use jarvis_action::ActionError;
use jarvis_core::error::JarvisError;

/// Prefix of the degraded reply shown in place of an assistant answer.
pub const ERROR_MARKER: &str = "Error: ";

/// Coarse classification of gateway failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorKind {
    Auth,
    Quota,
    ModelNotFound,
    NoModelAvailable,
    InvalidRequest,
    Network,
    Timeout,
    Api,
    MalformedResponse,
    Blocked,
    Media,
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GatewayErrorKind::Auth => "auth",
            GatewayErrorKind::Quota => "quota",
            GatewayErrorKind::ModelNotFound => "model_not_found",
            GatewayErrorKind::NoModelAvailable => "no_model_available",
            GatewayErrorKind::InvalidRequest => "invalid_request",
            GatewayErrorKind::Network => "network",
            GatewayErrorKind::Timeout => "timeout",
            GatewayErrorKind::Api => "api",
            GatewayErrorKind::MalformedResponse => "malformed_response",
            GatewayErrorKind::Blocked => "blocked",
            GatewayErrorKind::Media => "media",
        };
        write!(f, "{}", s)
    }
}

/// Errors from the inference gateway and its endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("no model available (tried: {})", .tried.join(", "))]
    NoModelAvailable { tried: Vec<String> },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response blocked: {0}")]
    Blocked(String),
    #[error("media error: {0}")]
    Media(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Auth(_) => GatewayErrorKind::Auth,
            GatewayError::Quota(_) => GatewayErrorKind::Quota,
            GatewayError::ModelNotFound(_) => GatewayErrorKind::ModelNotFound,
            GatewayError::NoModelAvailable { .. } => GatewayErrorKind::NoModelAvailable,
            GatewayError::InvalidRequest(_) => GatewayErrorKind::InvalidRequest,
            GatewayError::Network(_) => GatewayErrorKind::Network,
            GatewayError::Timeout(_) => GatewayErrorKind::Timeout,
            GatewayError::Api { .. } => GatewayErrorKind::Api,
            GatewayError::MalformedResponse(_) => GatewayErrorKind::MalformedResponse,
            GatewayError::Blocked(_) => GatewayErrorKind::Blocked,
            GatewayError::Media(_) => GatewayErrorKind::Media,
        }
    }

    /// The fixed-marker text shown to the user in place of a reply.
    pub fn degraded_reply(&self) -> String {
        format!("{}{}", ERROR_MARKER, self)
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Media(err.to_string())
    }
}

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("voice error: {0}")]
    VoiceError(String),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("action error: {0}")]
    Action(#[from] ActionError),
    #[error("configuration error: {0}")]
    Config(#[from] JarvisError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let cases: Vec<(GatewayError, &str)> = vec![
            (
                GatewayError::Auth("API key not valid".to_string()),
                "authentication failed: API key not valid",
            ),
            (
                GatewayError::Quota("limit 15/min".to_string()),
                "quota exceeded: limit 15/min",
            ),
            (
                GatewayError::ModelNotFound("gemini-9".to_string()),
                "model not found: gemini-9",
            ),
            (
                GatewayError::NoModelAvailable {
                    tried: vec!["a".to_string(), "b".to_string()],
                },
                "no model available (tried: a, b)",
            ),
            (
                GatewayError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                },
                "API error 503: overloaded",
            ),
            (
                GatewayError::Blocked("SAFETY".to_string()),
                "response blocked: SAFETY",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            GatewayError::Timeout("60s".to_string()).kind(),
            GatewayErrorKind::Timeout
        );
        assert_eq!(
            GatewayError::Media("disk full".to_string()).kind(),
            GatewayErrorKind::Media
        );
        assert_eq!(GatewayErrorKind::ModelNotFound.to_string(), "model_not_found");
    }

    #[test]
    fn test_degraded_reply_has_marker() {
        let err = GatewayError::Network("connection refused".to_string());
        let reply = err.degraded_reply();
        assert!(reply.starts_with(ERROR_MARKER));
        assert_eq!(reply, "Error: network error: connection refused");
    }

    #[test]
    fn test_io_error_becomes_media_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: GatewayError = io_err.into();
        assert_eq!(err.kind(), GatewayErrorKind::Media);
    }

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(4000).to_string(),
            "message exceeds maximum length of 4000 characters"
        );
        assert_eq!(
            ChatError::VoiceError("not a WAV file".to_string()).to_string(),
            "voice error: not a WAV file"
        );
    }

    #[test]
    fn test_chat_error_conversions() {
        let err: ChatError = GatewayError::Quota("x".to_string()).into();
        assert!(matches!(err, ChatError::Gateway(_)));

        let err: ChatError = ActionError::EmptyName.into();
        assert!(matches!(err, ChatError::Action(_)));

        let err: ChatError = JarvisError::Config("bad".to_string()).into();
        assert!(matches!(err, ChatError::Config(_)));
    }
}
