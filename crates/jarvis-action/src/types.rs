//! Core types for the command-dispatch protocol.
//!
//! Defines the directive parsed out of model text, the interpreter's outcome,
//! and the navigation request handed to the render surface.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// Directive
// =============================================================================

/// An "open application" request parsed out of assistant text.
///
/// Transient: never stored in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDirective {
    /// Lowercased action name.
    pub action_name: String,
}

/// What the interpreter decided to do with a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectiveAction {
    /// The name resolved; the caller should navigate to `target_uri`.
    Navigate { name: String, target_uri: String },
    /// The name is not in the registry.
    Unresolved { name: String },
}

impl DirectiveAction {
    pub fn name(&self) -> &str {
        match self {
            DirectiveAction::Navigate { name, .. } | DirectiveAction::Unresolved { name } => name,
        }
    }

    pub fn target_uri(&self) -> Option<&str> {
        match self {
            DirectiveAction::Navigate { target_uri, .. } => Some(target_uri),
            DirectiveAction::Unresolved { .. } => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, DirectiveAction::Unresolved { .. })
    }
}

impl fmt::Display for DirectiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveAction::Navigate { name, target_uri } => {
                write!(f, "open {} -> {}", name, target_uri)
            }
            DirectiveAction::Unresolved { name } => write!(f, "open {} (unresolved)", name),
        }
    }
}

/// Result of scanning one assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Text to show the user, with directive tags removed.
    pub display_text: String,
    /// The first directive found, if any.
    pub action: Option<DirectiveAction>,
    /// Names of further directives that were stripped but not honored.
    pub ignored: Vec<String>,
}

impl Interpretation {
    /// An interpretation that leaves the text untouched.
    pub fn passthrough(text: impl Into<String>) -> Self {
        Self {
            display_text: text.into(),
            action: None,
            ignored: Vec::new(),
        }
    }
}

// =============================================================================
// Navigation
// =============================================================================

/// A fire-and-forget request for the render surface to open a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    /// Action name that produced the request.
    pub name: String,
    pub uri: String,
    /// How long to wait before navigating, so the reply renders first.
    pub delay: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_action_accessors() {
        let nav = DirectiveAction::Navigate {
            name: "youtube".to_string(),
            target_uri: "vnd.youtube://".to_string(),
        };
        assert_eq!(nav.name(), "youtube");
        assert_eq!(nav.target_uri(), Some("vnd.youtube://"));
        assert!(!nav.is_unresolved());

        let unresolved = DirectiveAction::Unresolved {
            name: "fakeapp".to_string(),
        };
        assert_eq!(unresolved.name(), "fakeapp");
        assert_eq!(unresolved.target_uri(), None);
        assert!(unresolved.is_unresolved());
    }

    #[test]
    fn test_directive_action_display() {
        let nav = DirectiveAction::Navigate {
            name: "spotify".to_string(),
            target_uri: "spotify://".to_string(),
        };
        assert_eq!(nav.to_string(), "open spotify -> spotify://");

        let unresolved = DirectiveAction::Unresolved {
            name: "fakeapp".to_string(),
        };
        assert_eq!(unresolved.to_string(), "open fakeapp (unresolved)");
    }

    #[test]
    fn test_directive_action_serialization() {
        let unresolved = DirectiveAction::Unresolved {
            name: "fakeapp".to_string(),
        };
        let json = serde_json::to_value(&unresolved).unwrap();
        assert_eq!(json["kind"], "unresolved");
        assert_eq!(json["name"], "fakeapp");

        let back: DirectiveAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, unresolved);
    }

    #[test]
    fn test_passthrough() {
        let interp = Interpretation::passthrough("hello");
        assert_eq!(interp.display_text, "hello");
        assert!(interp.action.is_none());
        assert!(interp.ignored.is_empty());
    }
}
