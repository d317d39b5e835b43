use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Who authored a turn in the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Media
// =============================================================================

/// Opaque audio payload attached to a voice turn.
///
/// The bytes are never inspected; only the MIME type is forwarded to the
/// inference endpoint on upload.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl MediaBlob {
    /// Wrap a WAV recording as produced by the speech-capture widget.
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "audio/wav".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaBlob")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// =============================================================================
// Turn
// =============================================================================

/// One message in a conversation.
///
/// Turns are immutable once appended to a transcript; fields are only
/// readable through accessors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(skip)]
    media: Option<MediaBlob>,
    created_at: Timestamp,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), None)
    }

    /// A user turn carrying a voice recording. `content` is the placeholder
    /// text displayed in the transcript.
    pub fn user_with_media(content: impl Into<String>, media: MediaBlob) -> Self {
        Self::new(Role::User, content.into(), Some(media))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), None)
    }

    fn new(role: Role, content: String, media: Option<MediaBlob>) -> Self {
        Self {
            role,
            content,
            media,
            created_at: Timestamp::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn media(&self) -> Option<&MediaBlob> {
        self.media.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");

        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_role_display_and_from_str() {
        for role in [Role::User, Role::Assistant] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("model".parse::<Role>().is_err());
    }

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.content(), "hello");
        assert!(turn.media().is_none());

        let turn = Turn::assistant("At your service.");
        assert_eq!(turn.role(), Role::Assistant);
    }

    #[test]
    fn test_turn_with_media() {
        let turn = Turn::user_with_media("[voice]", MediaBlob::wav(vec![1, 2, 3]));
        let media = turn.media().unwrap();
        assert_eq!(media.mime_type, "audio/wav");
        assert_eq!(media.len(), 3);
    }

    #[test]
    fn test_turn_serialization_skips_media() {
        let turn = Turn::user_with_media("[voice]", MediaBlob::wav(vec![0; 16]));
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "[voice]");
        assert!(json.get("media").is_none());
    }

    #[test]
    fn test_media_blob_debug_hides_bytes() {
        let blob = MediaBlob::wav(vec![42; 1024]);
        let dbg = format!("{:?}", blob);
        assert!(dbg.contains("len: 1024"));
        assert!(!dbg.contains("42, 42"));
    }

    #[test]
    fn test_timestamp_to_datetime() {
        let ts = Timestamp::now();
        assert_eq!(ts.to_datetime().timestamp(), ts.0);
    }
}
